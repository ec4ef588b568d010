//! Job submission and job-scoped forwarding.
//!
//! A new job runs as a linear sequence of stages, each awaited before the
//! next starts and each able to end the request early:
//!
//! ```text
//! spool body → decode form → check image limit → select node
//!   → validate options → forward spool → buffer response → record affinity
//! ```
//!
//! The spool file lives for the whole sequence and is removed when it goes
//! out of scope, whichever stage ends the request.

use super::options::limited_options;
use crate::error::{GatewayError, GatewayResult};
use crate::proxy::{BufferedResponse, ForwardBody};
use crate::state::AppState;
use crate::upload::{self, SpoolFile};
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, request::Parts},
    response::Response,
};
use serde_json::Value;
use std::sync::Arc;
use tilemux_kernel::{BackendNode, CallerSession, JobId};
use tracing::{debug, info, warn};

/// Field of the node's job-creation response that carries the job id.
pub const JOB_ID_FIELD: &str = "uuid";

pub async fn new_job(
    state: &AppState,
    session: &CallerSession,
    parts: &Parts,
    body: Body,
) -> GatewayResult<Response> {
    let spool = SpoolFile::write(&state.spool_dir, body).await?;

    let content_type = parts.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let manifest = upload::decode(&spool, content_type).await?;

    if let Some(max) = session.max_images() {
        if max >= 0 && manifest.image_count > max as u64 {
            return Err(GatewayError::OptionValidationFailure(format!(
                "Cannot process more than {max} images"
            )));
        }
    }

    let node = state
        .registry
        .find_best_available_node(manifest.image_count, true)
        .await
        .ok_or(GatewayError::NoNodesAvailable)?;

    let allowed = limited_options(state, &node, session);
    state
        .limiter
        .filter_options(manifest.options_str(), &allowed)
        .map_err(|e| GatewayError::OptionValidationFailure(e.to_string()))?;

    info!(node = %node.id(), images = manifest.image_count, bytes = spool.len(), "dispatching new job");
    let outbound = ForwardBody::Spooled(spool.reader().await?, spool.len());
    let response = state.proxy.buffered(&node, parts, outbound).await?;

    record_affinity(state, &node, &response)?;
    Ok(response.replay())
}

/// Parse the node's answer and remember which node owns the new job.
fn record_affinity(
    state: &AppState,
    node: &Arc<BackendNode>,
    response: &BufferedResponse,
) -> GatewayResult<()> {
    let parsed: Value = serde_json::from_slice(&response.body)
        .map_err(|e| GatewayError::MalformedBackendResponse(e.to_string()))?;

    match parsed.get(JOB_ID_FIELD).and_then(Value::as_str).map(JobId::parse) {
        Some(Ok(job)) => {
            info!(job_id = %job, node = %node.id(), "recorded job affinity");
            state.affinity.add(job, Arc::clone(node));
        }
        Some(Err(e)) => warn!(node = %node.id(), error = %e, "node returned an unusable job id"),
        None => debug!(node = %node.id(), "node response carries no job id"),
    }
    Ok(())
}

/// Forward a follow-up request to the node that owns `job`.
pub async fn job_scoped(
    state: &AppState,
    job: JobId,
    parts: &Parts,
    body: Body,
) -> GatewayResult<Response> {
    let Some(node) = state.affinity.lookup(&job) else {
        return Err(GatewayError::UnknownAffinity(job));
    };
    debug!(job_id = %job, node = %node.id(), "routing by affinity");
    state
        .proxy
        .stream(&node, parts, ForwardBody::Passthrough(body))
        .await
}
