//! Gateway error types
//!
//! Every failure the request pipeline detects is converted at the point of
//! detection into one of these variants and returned to the caller as
//! `200 OK` with a `{"error": "<message>"}` body.  Clients of the node API
//! read failures from the body, not the status line, so the status stays
//! 200 for all application-level errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tilemux_kernel::JobId;

/// Runtime errors of the gateway core.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid authentication token")]
    AuthenticationFailure,

    #[error("No nodes available")]
    NoNodesAvailable,

    /// Carries the limiter's message unchanged.
    #[error("{0}")]
    OptionValidationFailure(String),

    #[error("Uploading images from a URL is not supported")]
    UnsupportedUploadMode,

    #[error("Malformed response from processing node: {0}")]
    MalformedBackendResponse(String),

    #[error("Task {0} not found")]
    UnknownAffinity(JobId),

    #[error("Cannot route {0}")]
    UnroutablePath(String),

    #[error("Malformed upload: {0}")]
    MalformedUpload(String),

    #[error("Upload spool error: {0}")]
    Spool(String),

    #[error("Proxy error: {0}")]
    Proxy(String),
}

impl GatewayError {
    /// Stable machine-readable code used in log fields.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::AuthenticationFailure => "AUTHENTICATION_FAILURE",
            GatewayError::NoNodesAvailable => "NO_NODES_AVAILABLE",
            GatewayError::OptionValidationFailure(_) => "OPTION_VALIDATION_FAILURE",
            GatewayError::UnsupportedUploadMode => "UNSUPPORTED_UPLOAD_MODE",
            GatewayError::MalformedBackendResponse(_) => "MALFORMED_BACKEND_RESPONSE",
            GatewayError::UnknownAffinity(_) => "UNKNOWN_AFFINITY",
            GatewayError::UnroutablePath(_) => "UNROUTABLE_PATH",
            GatewayError::MalformedUpload(_) => "MALFORMED_UPLOAD",
            GatewayError::Spool(_) => "SPOOL_ERROR",
            GatewayError::Proxy(_) => "PROXY_ERROR",
        }
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Spool(err.to_string())
    }
}

/// The request URL is dropped from the message: after credential rewrite it
/// carries the node's token.
impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Proxy(err.without_url().to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
