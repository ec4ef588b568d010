//! Configuration loading.
//!
//! Gateway configuration is layered: an optional file (format detected from
//! its extension, with `${VAR}` / `$VAR` environment substitution applied to
//! the raw text) and then `PREFIX__FIELD` environment variables, which win.
//!
//! ## Supported extensions
//!
//! - YAML: `.yaml`, `.yml`
//! - TOML: `.toml`
//! - JSON: `.json`

use crate::error::{KernelError, KernelResult};
use config::{Config as Cfg, Environment, File};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::LazyLock;

pub use config::FileFormat;

static BRACED_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex"));
static BARE_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b").expect("static regex"));

/// Detect configuration format from file extension.
pub fn detect_format(path: &Path) -> KernelResult<FileFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| KernelError::UnsupportedFormat("no file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        _ => Err(KernelError::UnsupportedFormat(ext.to_string())),
    }
}

/// Substitute environment variables in a string.
///
/// `${VAR_NAME}` is replaced first, then bare `$VAR_NAME`.  References to
/// unset variables are left untouched.
pub fn substitute_env_vars(content: &str) -> String {
    let braced = BRACED_VAR.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    BARE_VAR
        .replace_all(&braced, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Parse configuration from a string with an explicit format.
pub fn from_str<T>(content: &str, format: FileFormat) -> KernelResult<T>
where
    T: DeserializeOwned,
{
    let substituted = substitute_env_vars(content);
    Cfg::builder()
        .add_source(File::from_str(&substituted, format))
        .build()
        .map_err(|e| KernelError::ConfigParse(e.to_string()))?
        .try_deserialize()
        .map_err(|e| KernelError::ConfigParse(e.to_string()))
}

/// Load configuration from an optional file plus environment overrides.
///
/// Environment variables use `env_prefix` and double underscores for
/// nesting: with prefix `TILEMUX`, `TILEMUX__PORT=8080` sets `port`.
pub fn load_with_env<T>(path: Option<&Path>, env_prefix: &str) -> KernelResult<T>
where
    T: DeserializeOwned,
{
    let mut builder = Cfg::builder();

    if let Some(path) = path {
        let format = detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        builder = builder.add_source(File::from_str(&substitute_env_vars(&content), format));
    }

    builder
        .add_source(
            Environment::with_prefix(env_prefix)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| KernelError::ConfigParse(e.to_string()))?
        .try_deserialize()
        .map_err(|e| KernelError::ConfigParse(e.to_string()))
}
