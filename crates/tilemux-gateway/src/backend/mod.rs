//! Backend module.

mod affinity;
mod authorizer;
mod cache;
mod limiter;
mod registry;

pub use affinity::InMemoryAffinityTable;
pub use authorizer::{AllowAllAuthorizer, RemoteAuthorizer, StaticAuthorizer};
pub use cache::TtlCache;
pub use limiter::SchemaOptionLimiter;
pub use registry::InMemoryNodeRegistry;
