//! Graph storage backends and the load/mutate/save manager.

mod jsonl;
mod manager;
mod memory;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use jsonl::JsonlGraphStorage;
pub use kg_types::{
    Entity, GraphStorage, KgError, KnowledgeGraph, KnowledgeGraphService, ObservationDeletion,
    ObservationInput, ObservationResult, Relation, ValidationError,
};
pub use manager::KnowledgeGraphManager;
pub use memory::InMemoryGraphStorage;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteGraphStorage;
