//! Per-request caller context.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resource limits attached to a caller by the authorization service.
///
/// The payload is opaque to the gateway core; only the option limiter
/// interprets the `options` section, and the info handler reads
/// `maxImages`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Limits(Value);

impl Limits {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Largest image count the caller may submit per job.
    pub fn max_images(&self) -> Option<i64> {
        self.0.get("maxImages").and_then(Value::as_i64)
    }

    /// Constraint block for a single option, if the caller is limited on it.
    pub fn option_limit(&self, name: &str) -> Option<&Value> {
        self.0.get("options").and_then(|o| o.get(name))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Caller session derived from the `token` query parameter and the
/// authorization service's answer.  Recomputed on every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerSession {
    pub token: Option<String>,
    pub valid: bool,
    pub limits: Option<Limits>,
}

impl CallerSession {
    /// Key under which per-caller derived values are cached.
    pub fn cache_key(&self) -> &str {
        self.token.as_deref().unwrap_or("")
    }

    pub fn max_images(&self) -> Option<i64> {
        self.limits.as_ref().and_then(Limits::max_images)
    }
}
