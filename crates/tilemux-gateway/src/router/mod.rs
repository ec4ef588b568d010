//! Request classification.
//!
//! Every inbound request maps to exactly one [`Route`], evaluated in a
//! fixed priority order.  The dispatcher matches on the variant
//! exhaustively, so adding a route is a compile-checked change.

mod classify;

pub use classify::{NamedHandler, Route};
