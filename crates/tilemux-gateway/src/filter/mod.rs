//! Filter module.

mod auth;

pub use auth::{TokenGate, query_token};
