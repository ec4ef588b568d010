//! Job affinity table: kernel contract.
//!
//! Maps a job identifier to the node that created it so that every
//! follow-up request for the job reaches the same node.  An entry is added
//! once, when the node's job-creation response reports the id, and read by
//! every later job-scoped request.

use crate::job::JobId;
use crate::node::BackendNode;
use std::sync::Arc;

/// Kernel contract for the affinity table.
///
/// `add` for an id already present overwrites the entry; a job id is
/// reported by exactly one node, so a repeated add carries an equal value.
pub trait AffinityTable: Send + Sync {
    /// Prepare the table for use, discarding any previous entries.
    fn initialize(&self);

    /// Record that `job` lives on `node`.
    fn add(&self, job: JobId, node: Arc<BackendNode>);

    /// Node owning `job`, if known.
    fn lookup(&self, job: &JobId) -> Option<Arc<BackendNode>>;
}
