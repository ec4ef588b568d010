//! `tilemux-gateway`: Tilemux gateway runtime.
//!
//! This crate provides the request router in front of a pool of
//! image-processing nodes, plus concrete implementations of the collaborator
//! contracts defined in `tilemux-kernel`:
//!
//! | Kernel contract | Implementation |
//! |----------------|----------------|
//! | [`NodeRegistry`](tilemux_kernel::NodeRegistry) | [`backend::InMemoryNodeRegistry`] |
//! | [`Authorizer`](tilemux_kernel::Authorizer) | [`backend::AllowAllAuthorizer`], [`backend::StaticAuthorizer`], [`backend::RemoteAuthorizer`] |
//! | [`OptionLimiter`](tilemux_kernel::OptionLimiter) | [`backend::SchemaOptionLimiter`] |
//! | [`ValueCache`](tilemux_kernel::ValueCache) | [`backend::TtlCache`] |
//! | [`AffinityTable`](tilemux_kernel::AffinityTable) | [`backend::InMemoryAffinityTable`] |
//!
//! The [`server::GatewayServer`] wires everything together into an axum HTTP
//! service.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use tilemux_gateway::config::{GatewayServerConfig, NodeConfig};
//! use tilemux_gateway::server::GatewayServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = GatewayServerConfig {
//!         port: 3000,
//!         nodes: vec![NodeConfig {
//!             id: "node-1".into(),
//!             endpoint: "http://10.0.0.5:3000".into(),
//!             token: None,
//!             max_images: None,
//!             options: Vec::new(),
//!         }],
//!         ..Default::default()
//!     };
//!
//!     GatewayServer::new(config).start().await
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod proxy;
pub mod router;
pub mod server;
pub mod state;
pub mod upload;

// Re-export the kernel contract for convenience.
pub use tilemux_kernel as kernel;
