//! Tilemux kernel contract.
//!
//! This crate defines the *types and collaborator traits* consumed by the
//! Tilemux gateway core.  No HTTP handling lives here; the router,
//! streaming proxy, and concrete collaborators belong in `tilemux-gateway`.
//!
//! # Architecture mapping
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              tilemux-kernel  (this crate)                   │
//! │  JobId  BackendNode  NodeOption  Limits  CallerSession      │
//! │  NodeRegistry  Authorizer  OptionLimiter                    │
//! │  ValueCache  AffinityTable  KernelError  config loader      │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │  depends on
//! ┌──────────────────────────▼──────────────────────────────────┐
//! │              tilemux-gateway  (runtime crate)               │
//! │  request classifier + dispatcher   upload spool + decoder   │
//! │  credential rewrite + node proxy   affinity interception    │
//! │  InMemoryNodeRegistry  TtlCache  InMemoryAffinityTable      │
//! │  Static/Remote authorizers  SchemaOptionLimiter             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use tilemux_kernel::{BackendNode, JobId};
//!
//! let node = BackendNode::new("node-1", "http://10.0.0.5:3000".parse().unwrap())
//!     .with_token("abc");
//! assert_eq!(node.token(), Some("abc"));
//!
//! let job = JobId::parse("11111111-1111-1111-1111-111111111111").unwrap();
//! assert_eq!(
//!     JobId::find_in_path("/task/11111111-1111-1111-1111-111111111111/info"),
//!     Some(job)
//! );
//! ```

pub mod affinity;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod job;
pub mod limiter;
pub mod node;
pub mod options;
pub mod registry;
pub mod session;

// ── Flat re-exports ────────────────────────────────────────────────────────

pub use affinity::AffinityTable;
pub use auth::{Authorizer, Validation};
pub use cache::ValueCache;
pub use error::{KernelError, KernelResult};
pub use job::JobId;
pub use limiter::{OptionError, OptionLimiter};
pub use node::{BackendNode, NodeInfo};
pub use options::{NodeOption, SubmittedOption};
pub use registry::NodeRegistry;
pub use session::{CallerSession, Limits};
