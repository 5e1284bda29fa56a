//! Integration tests for the node advisory lock, using the public
//! `NodeApiClient` trait against an in-memory fake orchestrator client.

use async_trait::async_trait;
use gpu_scheduler_kernel::config::LockConfig;
use gpu_scheduler_kernel::error::{Error, Result};
use gpu_scheduler_kernel::lock::{acquire, release, set, NodeApiClient};
use std::collections::HashMap;
use tokio::sync::Mutex;

struct FakeNodeApi {
    nodes: Mutex<HashMap<String, HashMap<String, String>>>,
}

impl FakeNodeApi {
    fn new() -> Self {
        Self {
            nodes: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl NodeApiClient for FakeNodeApi {
    async fn get_annotations(&self, node_id: &str) -> Result<HashMap<String, String>> {
        Ok(self.nodes.lock().await.get(node_id).cloned().unwrap_or_default())
    }

    async fn update_annotations(
        &self,
        node_id: &str,
        expected: &HashMap<String, String>,
        next: HashMap<String, String>,
    ) -> Result<()> {
        let mut nodes = self.nodes.lock().await;
        let current = nodes.entry(node_id.to_string()).or_default();
        if current != expected {
            return Err(Error::LockContention {
                node_id: node_id.to_string(),
                reason: "annotations changed since read".to_string(),
            });
        }
        *current = next;
        Ok(())
    }
}

#[tokio::test]
async fn set_then_acquire_contends_then_release_clears_it() {
    let client = FakeNodeApi::new();
    let config = LockConfig::default();

    set(&client, &config, "node-a").await.unwrap();

    let err = acquire(&client, &config, "node-a").await.unwrap_err();
    assert!(matches!(err, Error::LockContention { .. }));

    release(&client, &config, "node-a").await.unwrap();
    acquire(&client, &config, "node-a").await.unwrap();
}

#[tokio::test]
async fn two_nodes_lock_independently() {
    let client = FakeNodeApi::new();
    let config = LockConfig::default();

    set(&client, &config, "node-a").await.unwrap();
    set(&client, &config, "node-b").await.unwrap();

    let a = client.get_annotations("node-a").await.unwrap();
    let b = client.get_annotations("node-b").await.unwrap();
    assert!(a.contains_key(&config.annotation_key));
    assert!(b.contains_key(&config.annotation_key));
}
