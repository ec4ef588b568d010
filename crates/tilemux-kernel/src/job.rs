//! Job identifiers minted by backend nodes.
//!
//! A job identifier is an opaque token of exactly five non-empty segments
//! joined by `-` (UUIDs are the common case).  Segments are ASCII letters
//! and digits only; `_` and other word characters are rejected so that no
//! ordinary path segment is mistaken for a job.  The identifier is
//! immutable once a node assigns it and is the key of the affinity table.

use crate::error::{KernelError, KernelResult};
use serde::{Deserialize, Serialize};
use std::fmt;

const SEGMENTS: usize = 5;

/// Validated job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

impl JobId {
    /// Parse a job identifier, rejecting anything that is not five
    /// hyphen-separated alphanumeric segments.
    pub fn parse(raw: &str) -> KernelResult<Self> {
        let mut count = 0;
        for segment in raw.split('-') {
            count += 1;
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_alphanumeric()) {
                return Err(KernelError::InvalidJobId(raw.to_string()));
            }
        }
        if count != SEGMENTS {
            return Err(KernelError::InvalidJobId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Return the first path segment that is a valid job identifier.
    pub fn find_in_path(path: &str) -> Option<Self> {
        path.split('/').find_map(|segment| Self::parse(segment).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for JobId {
    type Error = KernelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<JobId> for String {
    fn from(value: JobId) -> Self {
        value.0
    }
}
