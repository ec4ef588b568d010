//! Shared application state for the gateway router

use crate::backend::{InMemoryAffinityTable, SchemaOptionLimiter, TtlCache};
use crate::filter::TokenGate;
use crate::proxy::NodeProxy;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tilemux_kernel::{AffinityTable, Authorizer, NodeOption, NodeRegistry, OptionLimiter, ValueCache};

/// Limited option sets, cached per node and caller token.
pub type OptionsCache = dyn ValueCache<Arc<Vec<NodeOption>>>;

/// Default lifetime of a cached limited-options entry.
pub const DEFAULT_OPTIONS_TTL: Duration = Duration::from_secs(60);

/// Collaborators shared by every request.
///
/// Each collaborator is injected so that tests can substitute
/// deterministic fakes.  Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn NodeRegistry>,
    pub gate: TokenGate,
    pub limiter: Arc<dyn OptionLimiter>,
    pub options_cache: Arc<OptionsCache>,
    pub affinity: Arc<dyn AffinityTable>,
    pub proxy: NodeProxy,
    pub spool_dir: Arc<PathBuf>,
}

impl AppState {
    /// State with in-memory defaults for the limiter, cache, and affinity
    /// table, spooling uploads under the OS temp directory.
    pub fn new(registry: Arc<dyn NodeRegistry>, authorizer: Arc<dyn Authorizer>, proxy: NodeProxy) -> Self {
        let affinity: Arc<dyn AffinityTable> = Arc::new(InMemoryAffinityTable::new());
        affinity.initialize();
        Self {
            registry,
            gate: TokenGate::new(authorizer),
            limiter: Arc::new(SchemaOptionLimiter::new()),
            options_cache: Arc::new(TtlCache::new(DEFAULT_OPTIONS_TTL)),
            affinity,
            proxy,
            spool_dir: Arc::new(std::env::temp_dir().join("tilemux-spool")),
        }
    }

    /// Builder: replace the option limiter.
    pub fn with_limiter(mut self, limiter: Arc<dyn OptionLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Builder: replace the limited-options cache.
    pub fn with_options_cache(mut self, cache: Arc<OptionsCache>) -> Self {
        self.options_cache = cache;
        self
    }

    /// Builder: replace the affinity table.  The table is initialized here.
    pub fn with_affinity(mut self, affinity: Arc<dyn AffinityTable>) -> Self {
        affinity.initialize();
        self.affinity = affinity;
        self
    }

    /// Builder: spool uploads under `dir`.
    pub fn with_spool_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.spool_dir = Arc::new(dir.as_ref().to_path_buf());
        self
    }
}
