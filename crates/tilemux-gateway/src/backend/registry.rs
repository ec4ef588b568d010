//! In-memory [`NodeRegistry`] implementation.

use crate::proxy::rewrite_query;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tilemux_kernel::{BackendNode, KernelError, KernelResult, NodeInfo, NodeOption, NodeRegistry};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// [`NodeRegistry`] over a fixed, ordered list of nodes.
///
/// Nodes are registered once from configuration.  Their reported status
/// and options are kept current by [`refresh`](InMemoryNodeRegistry::refresh),
/// which replaces each node's snapshot as a whole.
#[derive(Default)]
pub struct InMemoryNodeRegistry {
    nodes: RwLock<Vec<Arc<BackendNode>>>,
}

impl InMemoryNodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node.  Ids must be unique.
    pub async fn register(&self, node: BackendNode) -> KernelResult<()> {
        let mut nodes = self.nodes.write().await;
        if nodes.iter().any(|n| n.id() == node.id()) {
            return Err(KernelError::DuplicateNode(node.id().to_string()));
        }
        info!(node = %node.id(), endpoint = %node.proxy_target_url(), "registered node");
        nodes.push(Arc::new(node));
        Ok(())
    }

    /// Current snapshot of every node, in registration order.
    pub async fn nodes(&self) -> Vec<Arc<BackendNode>> {
        self.nodes.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Arc<BackendNode>> {
        self.nodes.read().await.iter().find(|n| n.id() == id).cloned()
    }

    /// Poll every node's `/info` and `/options` and store the answers.
    ///
    /// A node that fails either call is kept with its last known options
    /// and marked offline until a later refresh succeeds.
    pub async fn refresh(&self, client: &Client) {
        for node in self.nodes().await {
            let updated = match poll(client, &node).await {
                Ok((mut info, options)) => {
                    info.online = true;
                    debug!(
                        node = %node.id(),
                        queue = info.task_queue_count,
                        options = options.len(),
                        "node status refreshed"
                    );
                    (*node).clone().with_info(info).with_options(options)
                }
                Err(e) => {
                    let e = e.without_url();
                    if node.info().online {
                        warn!(node = %node.id(), error = %e, "node went offline");
                    }
                    let mut info = node.info().clone();
                    info.online = false;
                    (*node).clone().with_info(info)
                }
            };
            self.replace(updated).await;
        }
    }

    async fn replace(&self, node: BackendNode) {
        let mut nodes = self.nodes.write().await;
        if let Some(slot) = nodes.iter_mut().find(|n| n.id() == node.id()) {
            *slot = Arc::new(node);
        }
    }
}

async fn poll(client: &Client, node: &BackendNode) -> Result<(NodeInfo, Vec<NodeOption>), reqwest::Error> {
    let info = fetch(client, node, "/info").await?;
    let options = fetch(client, node, "/options").await?;
    Ok((info, options))
}

async fn fetch<T: DeserializeOwned>(client: &Client, node: &BackendNode, path: &str) -> Result<T, reqwest::Error> {
    let query = rewrite_query(None, node.token());
    client
        .get(node.target_for(path, query.as_deref()))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

#[async_trait]
impl NodeRegistry for InMemoryNodeRegistry {
    async fn reference_node(&self) -> Option<Arc<BackendNode>> {
        self.nodes.read().await.iter().find(|n| n.info().online).cloned()
    }

    async fn find_best_available_node(&self, image_count: u64, strict: bool) -> Option<Arc<BackendNode>> {
        self.nodes
            .read()
            .await
            .iter()
            .filter(|n| n.info().online && n.admits(image_count))
            .filter(|n| !strict || n.has_free_slot())
            .min_by_key(|n| n.info().task_queue_count)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, queue: u64, max_images: Option<u64>, online: bool) -> BackendNode {
        let info = NodeInfo {
            task_queue_count: queue,
            max_images,
            max_parallel_tasks: 2,
            online,
            ..NodeInfo::default()
        };
        BackendNode::parse(id, "http://127.0.0.1:1").unwrap().with_info(info)
    }

    async fn registry(nodes: Vec<BackendNode>) -> InMemoryNodeRegistry {
        let reg = InMemoryNodeRegistry::new();
        for n in nodes {
            reg.register(n).await.unwrap();
        }
        reg
    }

    #[tokio::test]
    async fn duplicate_register_returns_error() {
        let reg = registry(vec![node("a", 0, None, true)]).await;
        assert_eq!(
            reg.register(node("a", 0, None, true)).await,
            Err(KernelError::DuplicateNode("a".into()))
        );
    }

    #[tokio::test]
    async fn reference_node_is_first_online() {
        let reg = registry(vec![node("a", 0, None, false), node("b", 0, None, true)]).await;
        assert_eq!(reg.reference_node().await.unwrap().id(), "b");
        assert!(InMemoryNodeRegistry::new().reference_node().await.is_none());
    }

    #[tokio::test]
    async fn best_node_has_shortest_queue_then_registration_order() {
        let reg = registry(vec![
            node("a", 1, None, true),
            node("b", 0, None, true),
            node("c", 0, None, true),
        ])
        .await;
        assert_eq!(reg.find_best_available_node(1, true).await.unwrap().id(), "b");
    }

    #[tokio::test]
    async fn image_limit_and_free_slots_are_respected() {
        let reg = registry(vec![node("small", 0, Some(10), true), node("busy", 2, None, true)]).await;
        assert_eq!(reg.find_best_available_node(5, true).await.unwrap().id(), "small");
        assert!(reg.find_best_available_node(50, true).await.is_none());
        assert_eq!(reg.find_best_available_node(50, false).await.unwrap().id(), "busy");
    }

    #[tokio::test]
    async fn refresh_marks_unreachable_nodes_offline() {
        let reg = registry(vec![node("a", 0, None, true)]).await;
        reg.refresh(&Client::new()).await;
        assert!(!reg.get("a").await.unwrap().info().online);
        assert!(reg.reference_node().await.is_none());
    }
}
