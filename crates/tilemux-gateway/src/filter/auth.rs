//! Token authentication gate.
//!
//! The caller's credential travels in the `token` query parameter on every
//! request; there is no header or cookie alternative.  The gate makes a
//! single call to the [`Authorizer`] and either yields a [`CallerSession`]
//! or stops the request with an authentication failure.  There is no retry.

use crate::error::GatewayError;
use std::sync::Arc;
use tilemux_kernel::{Authorizer, CallerSession};
use tracing::warn;

/// Decode the `token` parameter from a raw query string.
pub fn query_token(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
}

/// Authentication gate in front of every non-public route.
#[derive(Clone)]
pub struct TokenGate {
    authorizer: Arc<dyn Authorizer>,
}

impl TokenGate {
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self { authorizer }
    }

    /// Validate the token carried by `query`.
    ///
    /// An unreachable authorization service is treated like an invalid
    /// token.
    pub async fn authenticate(&self, query: Option<&str>) -> Result<CallerSession, GatewayError> {
        let token = query_token(query);
        match self.authorizer.validate(token.as_deref()).await {
            Ok(validation) if validation.valid => Ok(CallerSession {
                token,
                valid: true,
                limits: validation.limits,
            }),
            Ok(_) => {
                warn!(has_token = token.is_some(), "rejected request: invalid token");
                Err(GatewayError::AuthenticationFailure)
            }
            Err(err) => {
                warn!(error = %err, "rejected request: authorization service failed");
                Err(GatewayError::AuthenticationFailure)
            }
        }
    }
}
