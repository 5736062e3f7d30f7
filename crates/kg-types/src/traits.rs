//! Traits for storage backends and the graph service, plus the error taxonomy.

use crate::{
    Entity, KnowledgeGraph, ObservationDeletion, ObservationInput, ObservationResult, Relation,
    ValidationError,
};
use async_trait::async_trait;

/// Whole-graph persistence: read everything, write everything.
///
/// `load` returns an empty graph when the backing resource does not exist.
/// `save` replaces the resource in full.
#[async_trait]
pub trait GraphStorage: Send + Sync {
    async fn load(&self) -> Result<KnowledgeGraph, KgError>;

    async fn save(&self, graph: &KnowledgeGraph) -> Result<(), KgError>;
}

/// The operations exposed to callers (HTTP adapter, tests, embedders).
#[async_trait]
pub trait KnowledgeGraphService: Send + Sync {
    async fn read_graph(&self) -> Result<KnowledgeGraph, KgError>;

    async fn search_nodes(&self, query: &str) -> Result<KnowledgeGraph, KgError>;

    async fn open_nodes(&self, names: &[String]) -> Result<KnowledgeGraph, KgError>;

    /// Returns only the entities that were newly added.
    async fn create_entities(&self, entities: Vec<Entity>) -> Result<Vec<Entity>, KgError>;

    /// Returns only the relations that were newly added.
    async fn create_relations(&self, relations: Vec<Relation>) -> Result<Vec<Relation>, KgError>;

    /// Fails with [`KgError::NotFound`] if any named entity is missing.
    async fn add_observations(
        &self,
        updates: Vec<ObservationInput>,
    ) -> Result<Vec<ObservationResult>, KgError>;

    async fn delete_entities(&self, names: &[String]) -> Result<(), KgError>;

    /// Deletions naming a missing entity are skipped.
    async fn delete_observations(&self, deletions: &[ObservationDeletion]) -> Result<(), KgError>;

    async fn delete_relations(&self, relations: &[Relation]) -> Result<(), KgError>;
}

#[derive(Debug, thiserror::Error)]
pub enum KgError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("entity with name {0} not found")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("backend error: {0}")]
    Backend(String),
}
