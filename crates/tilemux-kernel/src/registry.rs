//! Node registry: kernel contract.
//!
//! The registry owns health/capacity bookkeeping for the node pool and the
//! node-selection heuristic.  The gateway core only asks two questions of
//! it: "give me any healthy node" and "give me the best node for this
//! demand".

use crate::node::BackendNode;
use async_trait::async_trait;
use std::sync::Arc;

/// Kernel contract for the backend node pool.
#[async_trait]
pub trait NodeRegistry: Send + Sync {
    /// An arbitrary healthy node used for aggregate and informational
    /// queries.  `None` when the pool has no usable node.
    async fn reference_node(&self) -> Option<Arc<BackendNode>>;

    /// Select a node able to run a job of `image_count` images under the
    /// current load.  With `strict`, nodes without a free processing slot
    /// are not eligible.  `None` when nothing matches the demand.
    async fn find_best_available_node(
        &self,
        image_count: u64,
        strict: bool,
    ) -> Option<Arc<BackendNode>>;
}
