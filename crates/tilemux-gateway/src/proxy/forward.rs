//! Node proxy.
//!
//! [`NodeProxy`] forwards a request to a backend node after rewriting its
//! credential.  Responses are streamed back unbuffered by default;
//! [`NodeProxy::buffered`] is the explicit opt-in for the one route that
//! must inspect the node's answer before replaying it.

use super::rewrite::rewrite_query;
use crate::error::{GatewayError, GatewayResult};
use axum::{
    body::{Body, Bytes},
    http::{
        HeaderMap, HeaderName, HeaderValue, StatusCode,
        header::{self, CONTENT_LENGTH},
        request::Parts,
    },
    response::Response,
};
use reqwest::{Client, redirect::Policy};
use std::time::Duration;
use tilemux_kernel::BackendNode;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument, warn};

/// Headers that describe a single connection and are never forwarded.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
];

/// Body sent to the node.
pub enum ForwardBody {
    /// The caller's body, streamed through as it arrives.
    Passthrough(Body),
    /// A spooled upload of known length, replayed from disk.
    Spooled(ReaderStream<File>, u64),
}

/// Status, headers, and full body of a buffered node response.
#[derive(Debug)]
pub struct BufferedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl BufferedResponse {
    /// Re-emit the exact buffered bytes to the caller.
    pub fn replay(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// HTTP client used for every call the gateway makes to a node.
#[derive(Clone)]
pub struct NodeProxy {
    client: Client,
}

impl NodeProxy {
    /// Build the proxy client.  Redirects are passed back to the caller,
    /// never followed, and only connecting is bounded in time.  Nodes are
    /// always reached directly, ignoring any system proxy settings.
    pub fn new(connect_timeout: Duration) -> GatewayResult<Self> {
        let client = Client::builder()
            .no_proxy()
            .redirect(Policy::none())
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Underlying client, shared with the registry's status polling.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Forward and stream the node's response back unmodified.
    pub async fn stream(
        &self,
        node: &BackendNode,
        parts: &Parts,
        body: ForwardBody,
    ) -> GatewayResult<Response> {
        let upstream = self.send(node, parts, body).await?;
        let status = upstream.status();
        let headers = strip_hop_by_hop(upstream.headers());

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }

    /// Forward and read the node's complete response into memory.
    pub async fn buffered(
        &self,
        node: &BackendNode,
        parts: &Parts,
        body: ForwardBody,
    ) -> GatewayResult<BufferedResponse> {
        let upstream = self.send(node, parts, body).await?;
        let status = upstream.status();
        let headers = strip_hop_by_hop(upstream.headers());
        let body = upstream.bytes().await?;
        Ok(BufferedResponse {
            status,
            headers,
            body,
        })
    }

    #[instrument(skip_all, fields(node = %node.id(), method = %parts.method, path = %parts.uri.path()))]
    async fn send(
        &self,
        node: &BackendNode,
        parts: &Parts,
        body: ForwardBody,
    ) -> GatewayResult<reqwest::Response> {
        let query = rewrite_query(parts.uri.query(), node.token());
        let url = node.target_for(parts.uri.path(), query.as_deref());
        debug!(target_host = url.host_str().unwrap_or(""), "forwarding to node");

        let mut headers = strip_hop_by_hop(&parts.headers);
        let mut builder = self.client.request(parts.method.clone(), url);
        match body {
            ForwardBody::Passthrough(body) => {
                if carries_body(&parts.headers) {
                    builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
                }
            }
            ForwardBody::Spooled(stream, len) => {
                headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
                builder = builder.body(reqwest::Body::wrap_stream(stream));
            }
        }

        builder.headers(headers).send().await.map_err(|e| {
            let e = e.without_url();
            warn!(node = %node.id(), error = %e, "node request failed");
            GatewayError::from(e)
        })
    }
}

fn carries_body(headers: &HeaderMap) -> bool {
    headers.contains_key(CONTENT_LENGTH) || headers.contains_key(header::TRANSFER_ENCODING)
}

/// Copy `headers` without hop-by-hop headers or anything named by
/// `Connection`.
pub fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if HOP_BY_HOP.contains(&name.as_str()) || listed.contains(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}
