//! In-memory graph storage, used as a fixture and for ephemeral stores.

use async_trait::async_trait;
use kg_types::{GraphStorage, KgError, KnowledgeGraph};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Holds the last saved graph. `None` models a resource that was never written.
#[derive(Clone, Default)]
pub struct InMemoryGraphStorage {
    graph: Arc<RwLock<Option<KnowledgeGraph>>>,
}

impl InMemoryGraphStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already persisted graph.
    pub fn with_graph(graph: KnowledgeGraph) -> Self {
        Self {
            graph: Arc::new(RwLock::new(Some(graph))),
        }
    }

    /// Whether anything has been saved yet.
    pub async fn is_persisted(&self) -> bool {
        self.graph.read().await.is_some()
    }
}

#[async_trait]
impl GraphStorage for InMemoryGraphStorage {
    async fn load(&self) -> Result<KnowledgeGraph, KgError> {
        Ok(self.graph.read().await.clone().unwrap_or_default())
    }

    async fn save(&self, graph: &KnowledgeGraph) -> Result<(), KgError> {
        *self.graph.write().await = Some(graph.clone());
        Ok(())
    }
}
