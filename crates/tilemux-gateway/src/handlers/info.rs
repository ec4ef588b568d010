//! `/info`: gateway status synthesized for the caller.
//!
//! The gateway presents itself as a single node with no meaningful
//! capacity limits.  Only `maxImages` reflects the caller's own limits, and
//! the engine fields are borrowed from the reference node.

use crate::state::AppState;
use axum::{Json, response::IntoResponse, response::Response};
use serde_json::json;
use tilemux_kernel::CallerSession;

/// Sentinel reported for counters that have no meaningful limit.
pub const UNLIMITED: u64 = 99_999_999;

/// Reported for engine fields when no node is available.
pub const UNKNOWN: &str = "?";

pub async fn info(state: &AppState, session: &CallerSession) -> Response {
    let reference = state.registry.reference_node().await;
    let (engine, engine_version) = reference
        .as_deref()
        .map(|node| (node.info().engine.clone(), node.info().engine_version.clone()))
        .unwrap_or_else(|| (UNKNOWN.to_string(), UNKNOWN.to_string()));

    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "taskQueueCount": 0,
        "totalMemory": UNLIMITED,
        "availableMemory": UNLIMITED,
        "cpuCores": UNLIMITED,
        "maxImages": session.max_images().unwrap_or(-1),
        "maxParallelTasks": UNLIMITED,
        "engineVersion": engine_version,
        "engine": engine,
    }))
    .into_response()
}
