//! Forwarding to backend nodes.

mod forward;
mod rewrite;

pub use forward::{BufferedResponse, ForwardBody, NodeProxy, strip_hop_by_hop};
pub use rewrite::{TOKEN_PARAM, rewrite_query};
