//! Plain forwarding to the reference node (public assets and `/`).

use crate::error::{GatewayError, GatewayResult};
use crate::proxy::ForwardBody;
use crate::state::AppState;
use axum::{body::Body, http::request::Parts, response::Response};

pub async fn to_reference_node(state: &AppState, parts: &Parts, body: Body) -> GatewayResult<Response> {
    let node = state
        .registry
        .reference_node()
        .await
        .ok_or(GatewayError::NoNodesAvailable)?;
    state
        .proxy
        .stream(&node, parts, ForwardBody::Passthrough(body))
        .await
}
