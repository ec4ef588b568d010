//! Error types for `tilemux-kernel`.
//!
//! [`KernelError`] covers failures detected while *defining* the gateway
//! (malformed job identifiers, invalid node endpoints, duplicate node
//! registrations, unreadable configuration) plus the one collaborator
//! failure the core has to reason about: the authorization service being
//! unreachable.  Request-time failures (no node available, proxy errors, …)
//! belong in the gateway implementation crate (`tilemux-gateway`).

use thiserror::Error;

/// Definition-time / collaborator error type for the kernel contract.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum KernelError {
    // ── Jobs ─────────────────────────────────────────────────────────────────
    /// The string is not a five-segment hyphenated job identifier.
    #[error("'{0}' is not a valid job identifier")]
    InvalidJobId(String),

    // ── Nodes ────────────────────────────────────────────────────────────────
    /// A node `id` field is empty or whitespace-only.
    #[error("node id cannot be empty")]
    EmptyNodeId,

    /// A node with this id has already been registered.
    #[error("node '{0}' is already registered")]
    DuplicateNode(String),

    /// A node endpoint URI is syntactically invalid.
    #[error("node '{0}' has an invalid endpoint URI: {1}")]
    InvalidEndpoint(String, String),

    // ── Authorization ────────────────────────────────────────────────────────
    /// The external authorization service could not be reached or answered
    /// with something that is not a validation result.
    #[error("authorization service unavailable: {0}")]
    AuthorizationUnavailable(String),

    // ── Configuration ────────────────────────────────────────────────────────
    /// A configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigIo(String),

    /// A configuration file extension is not one of the supported formats.
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// A configuration source could not be parsed or deserialized.
    #[error("configuration parsing error: {0}")]
    ConfigParse(String),
}

impl From<std::io::Error> for KernelError {
    fn from(err: std::io::Error) -> Self {
        KernelError::ConfigIo(err.to_string())
    }
}

/// Result alias for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;
