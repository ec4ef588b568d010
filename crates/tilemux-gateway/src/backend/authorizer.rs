//! [`Authorizer`] implementations.

use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use tilemux_kernel::{Authorizer, KernelError, Limits, Validation};
use tracing::{debug, instrument};
use url::Url;

/// Accepts every caller, with no limits.  For trusted networks only.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAllAuthorizer;

#[async_trait]
impl Authorizer for AllowAllAuthorizer {
    async fn validate(&self, _token: Option<&str>) -> Result<Validation, KernelError> {
        Ok(Validation::valid(None))
    }
}

/// Fixed token table loaded from configuration.
#[derive(Debug, Default, Clone)]
pub struct StaticAuthorizer {
    tokens: HashMap<String, Option<Limits>>,
}

impl StaticAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: accept `token`, optionally with caller limits.
    pub fn with_token(mut self, token: impl Into<String>, limits: Option<Limits>) -> Self {
        self.tokens.insert(token.into(), limits);
        self
    }
}

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn validate(&self, token: Option<&str>) -> Result<Validation, KernelError> {
        Ok(token
            .and_then(|t| self.tokens.get(t))
            .map_or_else(Validation::invalid, |limits| Validation::valid(limits.clone())))
    }
}

/// Delegates to an external authorization service.
///
/// Issues `GET {url}?token=<token>` and expects
/// `{"valid": bool, "limits": {...}}` in return.
#[derive(Clone)]
pub struct RemoteAuthorizer {
    client: Client,
    url: Url,
}

impl RemoteAuthorizer {
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl Authorizer for RemoteAuthorizer {
    #[instrument(skip_all, fields(service = %self.url))]
    async fn validate(&self, token: Option<&str>) -> Result<Validation, KernelError> {
        let mut url = self.url.clone();
        if let Some(token) = token {
            url.query_pairs_mut().append_pair("token", token);
        }

        let unavailable = |e: reqwest::Error| KernelError::AuthorizationUnavailable(e.without_url().to_string());
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;
        let validation: Validation = response.json().await.map_err(unavailable)?;

        debug!(valid = validation.valid, "authorization service answered");
        Ok(validation)
    }
}
