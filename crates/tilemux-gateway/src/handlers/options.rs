//! `/options`: the caller's limited view of node options.

use crate::error::{GatewayError, GatewayResult};
use crate::state::AppState;
use axum::{Json, response::IntoResponse, response::Response};
use std::sync::Arc;
use tilemux_kernel::{BackendNode, CallerSession, NodeOption};
use tracing::debug;

pub async fn options(state: &AppState, session: &CallerSession) -> GatewayResult<Response> {
    let node = state
        .registry
        .reference_node()
        .await
        .ok_or(GatewayError::NoNodesAvailable)?;
    let limited = limited_options(state, &node, session);
    Ok(Json(limited.as_slice()).into_response())
}

/// Options of `node` narrowed to the caller's limits, computed on a cache
/// miss.
///
/// Concurrent misses each compute and store; the results are equal because
/// the limiter is a pure function of the node's options and the caller's
/// limits.
pub fn limited_options(
    state: &AppState,
    node: &BackendNode,
    session: &CallerSession,
) -> Arc<Vec<NodeOption>> {
    let key = format!("{}:{}", node.id(), session.cache_key());
    if let Some(hit) = state.options_cache.get(&key) {
        return hit;
    }
    debug!(node = %node.id(), "computing limited options");
    let computed = state
        .limiter
        .options_with_limits(node.options(), session.limits.as_ref());
    state.options_cache.set(&key, Arc::new(computed))
}
