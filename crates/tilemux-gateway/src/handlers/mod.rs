//! Request handlers, one per [`Route`](crate::router::Route) family.

pub mod forward;
pub mod info;
pub mod options;
pub mod task;

pub use forward::to_reference_node;
pub use info::info;
pub use options::{limited_options, options};
pub use task::{job_scoped, new_job};
