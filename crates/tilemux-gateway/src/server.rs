//! Axum-based HTTP gateway server.
//!
//! [`GatewayServer`] wires the classifier, authentication gate, upload
//! pipeline, and node proxy into a running axum service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `ANY`  | `*.css`, `*.js`, fonts | Forward to the reference node, no auth. |
//! | `ANY`  | `/` | Forward to the reference node. |
//! | `ANY`  | `/info` | Synthesized gateway status. |
//! | `ANY`  | `/options` | Caller's limited node options. |
//! | `POST` | `/task/new` | Spool, validate, select a node, forward, record affinity. |
//! | `ANY`  | `/task/<jobId>/...` | Forward to the node that owns the job. |
//!
//! Every application-level failure is answered with `200 OK` and a
//! `{"error": "..."}` body.

use crate::backend::{InMemoryAffinityTable, InMemoryNodeRegistry, TtlCache};
use crate::config::GatewayServerConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::handlers;
use crate::proxy::NodeProxy;
use crate::router::{NamedHandler, Route};
use crate::state::AppState;
use crate::upload;
use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Duration;
use tilemux_kernel::NodeOption;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

/// Interval of the cache and affinity garbage collection task.
const GC_INTERVAL: Duration = Duration::from_secs(60);

// ─────────────────────────────────────────────────────────────────────────────
// GatewayServer
// ─────────────────────────────────────────────────────────────────────────────

/// High-level gateway server built from a [`GatewayServerConfig`].
pub struct GatewayServer {
    config: GatewayServerConfig,
}

impl GatewayServer {
    /// Create a new server from the given configuration.
    pub fn new(config: GatewayServerConfig) -> Self {
        Self { config }
    }

    /// Build the axum [`Router`] over an already assembled [`AppState`].
    ///
    /// Every request goes through one fallback dispatcher; there is no
    /// per-path routing table.
    pub fn build_app(state: AppState) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Bind to `{host}:{port}` and serve until Ctrl-C.
    ///
    /// Registers the configured nodes, sweeps stale spool files, and runs
    /// node polling and garbage collection in the background while serving.
    pub async fn start(self) -> anyhow::Result<()> {
        let config = self.config;

        let removed = upload::sweep_stale(&config.spool_dir).await?;
        if removed > 0 {
            info!(removed, dir = %config.spool_dir.display(), "removed stale spool files");
        }

        let proxy = NodeProxy::new(config.connect_timeout())?;

        let registry = Arc::new(InMemoryNodeRegistry::new());
        for node in &config.nodes {
            registry.register(node.to_node()?).await?;
        }
        if config.nodes.is_empty() {
            warn!("no nodes configured; every request will fail with 'No nodes available'");
        }

        if config.auth.is_disabled() {
            warn!("authentication is DISABLED. Do not use this configuration in production.");
        }
        let authorizer = config.auth.authorizer(proxy.client());

        let cache = Arc::new(TtlCache::new(config.options_cache_ttl()));
        let mut affinity = InMemoryAffinityTable::new();
        if let Some(retention) = config.affinity_retention() {
            affinity = affinity.with_retention(retention);
        }
        let affinity = Arc::new(affinity);

        let state = AppState::new(registry.clone(), authorizer, proxy.clone())
            .with_options_cache(cache.clone())
            .with_affinity(affinity.clone())
            .with_spool_dir(&config.spool_dir);

        let mut background = vec![spawn_gc(cache, affinity)];
        if let Some(interval) = config.node_refresh_interval() {
            background.push(spawn_refresh(registry, proxy, interval));
        }

        let app = Self::build_app(state);
        let addr = format!("{}:{}", config.host, config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!(addr = %addr, nodes = config.nodes.len(), "Tilemux gateway starting");

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;
        for task in background {
            task.abort();
        }
        info!("Tilemux gateway stopped");
        Ok(served?)
    }
}

fn spawn_gc(cache: Arc<TtlCache<Arc<Vec<NodeOption>>>>, affinity: Arc<InMemoryAffinityTable>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(GC_INTERVAL);
        loop {
            ticker.tick().await;
            cache.purge_expired();
            affinity.gc();
        }
    })
}

fn spawn_refresh(registry: Arc<InMemoryNodeRegistry>, proxy: NodeProxy, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            registry.refresh(proxy.client()).await;
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C; shutting down");
    }
    info!("shutdown signal received");
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

/// Classify the request and run its pipeline inside a per-request span.
async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let route = Route::classify(&parts.method, parts.uri.path());
    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        route = route.label(),
        method = %parts.method,
        path = %parts.uri.path(),
    );

    async move {
        match handle(&state, route, &parts, body).await {
            Ok(response) => response,
            Err(err) => {
                warn!(code = err.code(), error = %err, "request failed");
                err.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

async fn handle(state: &AppState, route: Route, parts: &Parts, body: Body) -> GatewayResult<Response> {
    if !route.requires_auth() {
        return handlers::to_reference_node(state, parts, body).await;
    }

    let session = state.gate.authenticate(parts.uri.query()).await?;
    debug!(limited = session.limits.is_some(), "caller authenticated");

    match route {
        Route::PublicAsset | Route::Direct => handlers::to_reference_node(state, parts, body).await,
        Route::Named(NamedHandler::Info) => Ok(handlers::info(state, &session).await),
        Route::Named(NamedHandler::Options) => handlers::options(state, &session).await,
        Route::NewJob => handlers::new_job(state, &session, parts, body).await,
        Route::JobScoped(job) => handlers::job_scoped(state, job, parts, body).await,
        Route::Unmatched => Err(GatewayError::UnroutablePath(parts.uri.path().to_string())),
    }
}
