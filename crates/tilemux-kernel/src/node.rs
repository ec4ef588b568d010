//! Backend processing nodes.
//!
//! A [`BackendNode`] is an immutable snapshot of one interchangeable
//! image-processing node: where to proxy to, which credential the gateway
//! presents to it, and the capacity/options it last reported.  Registries
//! hand out `Arc<BackendNode>` and replace the whole snapshot when a node's
//! state changes, so a request always sees a consistent view.

use crate::error::{KernelError, KernelResult};
use crate::options::NodeOption;
use serde::{Deserialize, Serialize};
use url::Url;

// ─────────────────────────────────────────────────────────────────────────────
// NodeInfo
// ─────────────────────────────────────────────────────────────────────────────

/// Status a node reports about itself on its `/info` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeInfo {
    /// Node software version.
    pub version: String,
    /// Processing engine name (e.g. `odm`).
    pub engine: String,
    /// Processing engine version.
    pub engine_version: String,
    /// Jobs currently queued or running on the node.
    pub task_queue_count: u64,
    /// Largest image count the node accepts per job; `None` means unlimited.
    pub max_images: Option<u64>,
    /// Jobs the node runs concurrently before queueing.
    pub max_parallel_tasks: u64,
    /// Whether the node answered its last status poll.
    #[serde(skip)]
    pub online: bool,
}

impl Default for NodeInfo {
    fn default() -> Self {
        Self {
            version: String::new(),
            engine: String::new(),
            engine_version: String::new(),
            task_queue_count: 0,
            max_images: None,
            max_parallel_tasks: 1,
            online: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BackendNode
// ─────────────────────────────────────────────────────────────────────────────

/// Snapshot of a backend node as seen by the gateway core.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendNode {
    id: String,
    endpoint: Url,
    token: Option<String>,
    info: NodeInfo,
    options: Vec<NodeOption>,
}

impl BackendNode {
    /// Construct a node with default info and no options.
    pub fn new(id: impl Into<String>, endpoint: Url) -> Self {
        Self {
            id: id.into(),
            endpoint,
            token: None,
            info: NodeInfo::default(),
            options: Vec::new(),
        }
    }

    /// Parse `endpoint` and construct a node, validating both fields.
    pub fn parse(id: impl Into<String>, endpoint: &str) -> KernelResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(KernelError::EmptyNodeId);
        }
        let url = Url::parse(endpoint)
            .map_err(|e| KernelError::InvalidEndpoint(id.clone(), e.to_string()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(KernelError::InvalidEndpoint(
                id,
                format!("endpoint '{endpoint}' must start with http:// or https://"),
            ));
        }
        Ok(Self::new(id, url))
    }

    /// Builder: set the credential the gateway presents to this node.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Builder: replace the reported info.
    pub fn with_info(mut self, info: NodeInfo) -> Self {
        self.info = info;
        self
    }

    /// Builder: replace the reported options.
    pub fn with_options(mut self, options: Vec<NodeOption>) -> Self {
        self.options = options;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The node's own credential, if it requires one.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    pub fn options(&self) -> &[NodeOption] {
        &self.options
    }

    /// Base URL every forwarded request is proxied to.
    pub fn proxy_target_url(&self) -> &Url {
        &self.endpoint
    }

    /// Absolute URL for `path` (and optional raw `query`) on this node.
    ///
    /// `path` is appended to any base path the endpoint carries, so a node
    /// mounted at `http://host/odm` receives `/task/new` as `/odm/task/new`.
    pub fn target_for(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.endpoint.clone();
        let base = self.endpoint.path().trim_end_matches('/');
        url.set_path(&format!("{base}{path}"));
        url.set_query(query.filter(|q| !q.is_empty()));
        url
    }

    /// Whether the node accepts a job of `image_count` images at all.
    pub fn admits(&self, image_count: u64) -> bool {
        self.info.max_images.is_none_or(|max| image_count <= max)
    }

    /// Whether the node has a free processing slot right now.
    pub fn has_free_slot(&self) -> bool {
        self.info.task_queue_count < self.info.max_parallel_tasks.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(endpoint: &str) -> BackendNode {
        BackendNode::parse("n1", endpoint).unwrap()
    }

    #[test]
    fn target_keeps_path_and_query() {
        let url = node("http://10.0.0.5:3000").target_for("/task/new", Some("token=a&x=1"));
        assert_eq!(url.as_str(), "http://10.0.0.5:3000/task/new?token=a&x=1");
    }

    #[test]
    fn target_respects_base_path() {
        let url = node("http://host/odm/").target_for("/info", None);
        assert_eq!(url.as_str(), "http://host/odm/info");
    }

    #[test]
    fn empty_query_is_dropped() {
        let url = node("http://host").target_for("/", Some(""));
        assert_eq!(url.as_str(), "http://host/");
    }

    #[test]
    fn invalid_endpoints_rejected() {
        assert!(matches!(
            BackendNode::parse("n1", "ftp://host"),
            Err(KernelError::InvalidEndpoint(..))
        ));
        assert!(matches!(
            BackendNode::parse("n1", "not a url"),
            Err(KernelError::InvalidEndpoint(..))
        ));
        assert_eq!(
            BackendNode::parse(" ", "http://host"),
            Err(KernelError::EmptyNodeId)
        );
    }

    #[test]
    fn empty_token_counts_as_none() {
        assert_eq!(node("http://host").with_token("").token(), None);
        assert_eq!(node("http://host").with_token("abc").token(), Some("abc"));
    }

    #[test]
    fn admission_checks_max_images_and_slots() {
        let limited = node("http://host").with_info(NodeInfo {
            max_images: Some(10),
            max_parallel_tasks: 2,
            task_queue_count: 2,
            ..NodeInfo::default()
        });
        assert!(limited.admits(10));
        assert!(!limited.admits(11));
        assert!(!limited.has_free_slot());
        assert!(node("http://host").admits(u64::MAX));
    }

    #[test]
    fn info_deserializes_from_node_payload() {
        let info: NodeInfo = serde_json::from_str(
            r#"{"version":"2.2.0","taskQueueCount":3,"maxImages":null,
                "maxParallelTasks":2,"engineVersion":"3.1.0","engine":"odm"}"#,
        )
        .unwrap();
        assert_eq!(info.task_queue_count, 3);
        assert_eq!(info.engine_version, "3.1.0");
        assert_eq!(info.max_images, None);
        assert!(info.online);
    }
}
