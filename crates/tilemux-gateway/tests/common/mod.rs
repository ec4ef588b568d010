//! Shared fixtures for gateway integration tests: a recording fake node
//! served on an ephemeral port, a scripted node registry, and a limiter
//! that counts how often limited options are computed.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    extract::State,
    http::{Method, Request, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tilemux_gateway::backend::{SchemaOptionLimiter, StaticAuthorizer};
use tilemux_gateway::proxy::NodeProxy;
use tilemux_gateway::server::GatewayServer;
use tilemux_gateway::state::AppState;
use tilemux_kernel::{
    BackendNode, Limits, NodeOption, NodeRegistry, OptionError, OptionLimiter, SubmittedOption,
};
use tower::ServiceExt;

pub const JOB: &str = "11111111-1111-1111-1111-111111111111";
pub const BOUNDARY: &str = "tilemuxTestBoundary";

// ── Fake node ────────────────────────────────────────────────────────────────

/// One request as received by the fake node.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Clone)]
struct FakeNodeState {
    requests: Arc<Mutex<Vec<Recorded>>>,
    new_job_body: &'static str,
}

/// In-process backend node.  `POST /task/new` answers with a fixed body;
/// every other path answers `node <path>`.
pub struct FakeNode {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeNode {
    pub async fn spawn(new_job_body: &'static str) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().fallback(record).with_state(FakeNodeState {
            requests: requests.clone(),
            new_job_body,
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, requests }
    }

    pub fn node(&self, id: &str) -> BackendNode {
        BackendNode::parse(id, &format!("http://{}", self.addr))
            .unwrap()
            .with_options(node_options())
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn record(State(state): State<FakeNodeState>, request: axum::extract::Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap();
    let path = parts.uri.path().to_string();
    state.requests.lock().unwrap().push(Recorded {
        method: parts.method.clone(),
        path: path.clone(),
        query: parts.uri.query().map(str::to_owned),
        body: body.to_vec(),
    });

    if path == "/task/new" {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            state.new_job_body,
        )
            .into_response()
    } else {
        format!("node {path}").into_response()
    }
}

pub fn node_options() -> Vec<NodeOption> {
    vec![
        NodeOption::new("min-num-features", "int", json!(10000)),
        NodeOption::new("dsm", "bool", json!(false)),
    ]
}

// ── Scripted registry ────────────────────────────────────────────────────────

/// Registry returning a fixed node (or none) and recording every demand.
pub struct ScriptedRegistry {
    node: Option<Arc<BackendNode>>,
    pub demands: Mutex<Vec<(u64, bool)>>,
}

impl ScriptedRegistry {
    pub fn with_node(node: BackendNode) -> Arc<Self> {
        Arc::new(Self {
            node: Some(Arc::new(node)),
            demands: Mutex::new(Vec::new()),
        })
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            node: None,
            demands: Mutex::new(Vec::new()),
        })
    }

    pub fn demands(&self) -> Vec<(u64, bool)> {
        self.demands.lock().unwrap().clone()
    }
}

#[async_trait]
impl NodeRegistry for ScriptedRegistry {
    async fn reference_node(&self) -> Option<Arc<BackendNode>> {
        self.node.clone()
    }

    async fn find_best_available_node(&self, image_count: u64, strict: bool) -> Option<Arc<BackendNode>> {
        self.demands.lock().unwrap().push((image_count, strict));
        self.node.clone()
    }
}

// ── Counting limiter ─────────────────────────────────────────────────────────

/// [`SchemaOptionLimiter`] that counts limited-options computations.
#[derive(Default)]
pub struct CountingLimiter {
    inner: SchemaOptionLimiter,
    computed: AtomicUsize,
}

impl CountingLimiter {
    pub fn computed(&self) -> usize {
        self.computed.load(Ordering::SeqCst)
    }
}

impl OptionLimiter for CountingLimiter {
    fn options_with_limits(&self, options: &[NodeOption], limits: Option<&Limits>) -> Vec<NodeOption> {
        self.computed.fetch_add(1, Ordering::SeqCst);
        self.inner.options_with_limits(options, limits)
    }

    fn filter_options(&self, submitted: &str, allowed: &[NodeOption]) -> Result<Vec<SubmittedOption>, OptionError> {
        self.inner.filter_options(submitted, allowed)
    }
}

// ── Gateway harness ──────────────────────────────────────────────────────────

/// Gateway app over the given registry.  Token `good` is accepted with
/// limits, `open` without; anything else is rejected.
pub struct Harness {
    pub app: Router,
    pub state: AppState,
    pub limiter: Arc<CountingLimiter>,
    pub spool: TempDir,
}

impl Harness {
    pub fn new(registry: Arc<dyn NodeRegistry>) -> Self {
        let authorizer = StaticAuthorizer::new()
            .with_token(
                "good",
                Some(Limits::new(json!({
                    "maxImages": 10,
                    "options": { "min-num-features": { "max": 8000 } }
                }))),
            )
            .with_token("open", None)
            .with_token("caller123", None);
        let limiter = Arc::new(CountingLimiter::default());
        let spool = TempDir::new().unwrap();
        let proxy = NodeProxy::new(Duration::from_secs(5)).unwrap();
        let state = AppState::new(registry, Arc::new(authorizer), proxy)
            .with_limiter(limiter.clone())
            .with_spool_dir(spool.path());
        let app = GatewayServer::build_app(state.clone());
        Self {
            app,
            state,
            limiter,
            spool,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    pub fn spool_files(&self) -> usize {
        std::fs::read_dir(self.spool.path()).unwrap().count()
    }
}

// ── Request builders ─────────────────────────────────────────────────────────

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn text_part(name: &str, value: &str) -> String {
    format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
}

pub fn file_part(file_name: &str) -> String {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{file_name}\"\r\n\
         Content-Type: image/jpeg\r\n\r\nJPEG-{file_name}\r\n"
    )
}

pub fn multipart(parts: &[String]) -> String {
    format!("{}--{BOUNDARY}--\r\n", parts.concat())
}

pub fn new_job(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap()
}
