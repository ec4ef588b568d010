//! Upload buffering and multipart decoding for new-job submissions.
//!
//! The raw request body is spooled to a temporary file in full before any
//! parsing starts.  The file is then reopened twice: once to count images
//! and extract the options field, and once more as the outbound body for
//! the selected node.

mod decode;
mod spool;

pub use decode::{OPTIONS_FIELD, UploadManifest, ZIP_URL_FIELD, decode};
pub use spool::{SPOOL_PREFIX, SpoolFile, sweep_stale};
