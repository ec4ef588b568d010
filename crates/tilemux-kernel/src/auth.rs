//! Authorization service: kernel contract.

use crate::error::KernelError;
use crate::session::Limits;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Answer of the authorization service for one token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    #[serde(default)]
    pub limits: Option<Limits>,
}

impl Validation {
    pub fn valid(limits: Option<Limits>) -> Self {
        Self {
            valid: true,
            limits,
        }
    }

    pub fn invalid() -> Self {
        Self::default()
    }
}

/// Kernel contract for the external authorization/limits service.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Validate the caller's `token` (absent when the query string carries
    /// none).
    ///
    /// Returns [`KernelError::AuthorizationUnavailable`] when the service
    /// could not answer; the gateway treats that as a rejection.
    async fn validate(&self, token: Option<&str>) -> Result<Validation, KernelError>;
}
