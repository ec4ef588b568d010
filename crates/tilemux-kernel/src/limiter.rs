//! Option limiter: kernel contract.
//!
//! The limiter owns the backend-specific option schema.  The gateway core
//! uses it twice per new job: to narrow a node's options to what a caller
//! may use, and to check the caller's submitted options against that
//! narrowed set.  Both operations are pure, so results may be cached per
//! (node, token) and recomputed on expiry without changing the outcome.

use crate::options::{NodeOption, SubmittedOption};
use crate::session::Limits;
use thiserror::Error;

/// A submitted option was not permitted.  The message is shown to the
/// caller verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct OptionError(pub String);

impl OptionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Kernel contract for option limiting and validation.
pub trait OptionLimiter: Send + Sync {
    /// Intersect `options` with the caller's permitted ranges and choices.
    fn options_with_limits(&self, options: &[NodeOption], limits: Option<&Limits>)
    -> Vec<NodeOption>;

    /// Check the raw options payload a caller submitted against `allowed`.
    ///
    /// An empty payload yields no options.  Any unknown, mistyped, or
    /// out-of-range option fails the whole submission.
    fn filter_options(
        &self,
        submitted: &str,
        allowed: &[NodeOption],
    ) -> Result<Vec<SubmittedOption>, OptionError>;
}
