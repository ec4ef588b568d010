//! Gateway configuration.
//!
//! Loaded from an optional YAML/TOML/JSON file (with `${VAR}` substitution)
//! and then overridden by `TILEMUX__*` environment variables, e.g.
//! `TILEMUX__PORT=8080` or `TILEMUX__AUTH__URL=http://auth/validate`.
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 3000
//! auth:
//!   type: static
//!   tokens:
//!     - token: s3cret
//!       limits: { maxImages: 200 }
//! nodes:
//!   - id: node-1
//!     endpoint: http://10.0.0.5:3000
//!     token: node-secret
//! ```

use crate::backend::{AllowAllAuthorizer, RemoteAuthorizer, StaticAuthorizer};
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tilemux_kernel::config::load_with_env;
use tilemux_kernel::{Authorizer, BackendNode, KernelResult, Limits, NodeInfo, NodeOption};
use url::Url;

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "TILEMUX";

/// Runtime configuration for [`GatewayServer`](crate::server::GatewayServer).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayServerConfig {
    /// Interface to bind (default: `0.0.0.0`).
    pub host: String,
    /// TCP port to listen on (default: 3000).
    pub port: u16,
    /// Directory for upload spool files.
    pub spool_dir: PathBuf,
    /// Lifetime of cached limited-options entries.
    pub options_cache_ttl_secs: u64,
    /// How long job affinities are kept; 0 keeps them forever.
    pub affinity_retention_secs: u64,
    /// Interval between node status polls; 0 disables polling.
    pub node_refresh_interval_secs: u64,
    /// Connect timeout for calls to nodes and the authorization service.
    pub connect_timeout_ms: u64,
    pub auth: AuthConfig,
    pub nodes: Vec<NodeConfig>,
}

impl Default for GatewayServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            spool_dir: std::env::temp_dir().join("tilemux-spool"),
            options_cache_ttl_secs: 60,
            affinity_retention_secs: 7 * 24 * 60 * 60,
            node_refresh_interval_secs: 30,
            connect_timeout_ms: 10_000,
            auth: AuthConfig::default(),
            nodes: Vec::new(),
        }
    }
}

impl GatewayServerConfig {
    /// Load from `path` (if any) and the environment.
    pub fn load(path: Option<&Path>) -> KernelResult<Self> {
        load_with_env(path, ENV_PREFIX)
    }

    pub fn options_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.options_cache_ttl_secs)
    }

    pub fn affinity_retention(&self) -> Option<Duration> {
        (self.affinity_retention_secs > 0).then(|| Duration::from_secs(self.affinity_retention_secs))
    }

    pub fn node_refresh_interval(&self) -> Option<Duration> {
        (self.node_refresh_interval_secs > 0).then(|| Duration::from_secs(self.node_refresh_interval_secs))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// How caller tokens are validated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthConfig {
    /// Every caller is accepted without limits.
    #[default]
    #[serde(rename = "none")]
    Disabled,
    /// A fixed token list.
    Static {
        #[serde(default)]
        tokens: Vec<StaticToken>,
    },
    /// An external authorization service.
    Remote { url: Url },
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaticToken {
    pub token: String,
    #[serde(default)]
    pub limits: Option<Limits>,
}

impl AuthConfig {
    /// Build the configured authorizer.  `client` is used by the remote
    /// variant.
    pub fn authorizer(&self, client: &Client) -> Arc<dyn Authorizer> {
        match self {
            AuthConfig::Disabled => Arc::new(AllowAllAuthorizer),
            AuthConfig::Static { tokens } => Arc::new(
                tokens
                    .iter()
                    .fold(StaticAuthorizer::new(), |auth, t| auth.with_token(&t.token, t.limits.clone())),
            ),
            AuthConfig::Remote { url } => Arc::new(RemoteAuthorizer::new(client.clone(), url.clone())),
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, AuthConfig::Disabled)
    }
}

/// One backend node.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub id: String,
    pub endpoint: String,
    /// Credential the gateway presents to this node.
    #[serde(default)]
    pub token: Option<String>,
    /// Largest job the node accepts, until its own `/info` says otherwise.
    #[serde(default)]
    pub max_images: Option<u64>,
    /// Options to advertise until the node's own `/options` is polled.
    #[serde(default)]
    pub options: Vec<NodeOption>,
}

impl NodeConfig {
    pub fn to_node(&self) -> KernelResult<BackendNode> {
        let mut node = BackendNode::parse(self.id.clone(), &self.endpoint)?
            .with_info(NodeInfo {
                max_images: self.max_images,
                ..NodeInfo::default()
            })
            .with_options(self.options.clone());
        if let Some(token) = &self.token {
            node = node.with_token(token.clone());
        }
        Ok(node)
    }
}
