//! Priority-ordered path classifier producing [`Route`] variants.
//!
//! Resolution order:
//!
//! 1. public asset suffix (`.css`, `.js`, fonts), no authentication
//! 2. the root path `/`
//! 3. named handlers (`/info`, `/options`)
//! 4. `POST /task/new`
//! 5. any path carrying a job identifier segment
//! 6. everything else

use axum::http::Method;
use tilemux_kernel::JobId;

const PUBLIC_ASSET_SUFFIXES: &[&str] = &[".css", ".js", ".woff", ".woff2", ".ttf", ".eot"];
const NEW_JOB_PATH: &str = "/task/new";

/// Endpoints answered by the gateway itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedHandler {
    Info,
    Options,
}

impl NamedHandler {
    fn from_path(path: &str) -> Option<Self> {
        match path {
            "/info" => Some(NamedHandler::Info),
            "/options" => Some(NamedHandler::Options),
            _ => None,
        }
    }
}

/// Classification outcome for one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Static asset served by the reference node without authentication.
    PublicAsset,
    /// The root path, forwarded to the reference node.
    Direct,
    /// Informational endpoint handled locally.
    Named(NamedHandler),
    /// Job submission: spool, decode, validate, select, forward, intercept.
    NewJob,
    /// Follow-up request for a known job, routed by affinity.
    JobScoped(JobId),
    /// Nothing matched.
    Unmatched,
}

impl Route {
    /// Classify a request by method and path.
    pub fn classify(method: &Method, path: &str) -> Self {
        if PUBLIC_ASSET_SUFFIXES.iter().any(|suffix| path.ends_with(suffix)) {
            return Route::PublicAsset;
        }
        if path == "/" {
            return Route::Direct;
        }
        if let Some(handler) = NamedHandler::from_path(path) {
            return Route::Named(handler);
        }
        if *method == Method::POST && path.trim_end_matches('/') == NEW_JOB_PATH {
            return Route::NewJob;
        }
        if let Some(job) = JobId::find_in_path(path) {
            return Route::JobScoped(job);
        }
        Route::Unmatched
    }

    /// Whether the caller's token must be validated before handling.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::PublicAsset)
    }

    /// Short label for log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Route::PublicAsset => "public-asset",
            Route::Direct => "direct",
            Route::Named(NamedHandler::Info) => "info",
            Route::Named(NamedHandler::Options) => "options",
            Route::NewJob => "new-job",
            Route::JobScoped(_) => "job-scoped",
            Route::Unmatched => "unmatched",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
