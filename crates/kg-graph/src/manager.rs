//! Load/mutate/save manager over any [`GraphStorage`].

use async_trait::async_trait;
use kg_types::{
    Entity, GraphStorage, KgError, KnowledgeGraph, KnowledgeGraphService, ObservationDeletion,
    ObservationInput, ObservationResult, Relation,
};
use std::collections::HashSet;
use tokio::sync::Mutex;

/// Runs every operation against a freshly loaded graph.
///
/// Record shapes are checked by the storage backend while decoding; typed
/// inputs are valid by construction.
///
/// Mutations hold `write_lock` across their whole load/mutate/save cycle, so
/// writers sharing one manager never overwrite each other's changes. Reads
/// do not take the lock. Nothing is persisted unless the whole mutation
/// succeeds.
pub struct KnowledgeGraphManager<S> {
    storage: S,
    write_lock: Mutex<()>,
}

impl<S: GraphStorage> KnowledgeGraphManager<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    async fn load_graph(&self) -> Result<KnowledgeGraph, KgError> {
        self.storage.load().await
    }

    /// Run `f` on the current graph and persist the result if it succeeds.
    async fn mutate<T, F>(&self, f: F) -> Result<T, KgError>
    where
        T: Send,
        F: FnOnce(&mut KnowledgeGraph) -> Result<T, KgError> + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut graph = self.load_graph().await?;
        let out = f(&mut graph)?;
        self.storage.save(&graph).await?;
        Ok(out)
    }
}

#[async_trait]
impl<S: GraphStorage> KnowledgeGraphService for KnowledgeGraphManager<S> {
    async fn read_graph(&self) -> Result<KnowledgeGraph, KgError> {
        self.load_graph().await
    }

    async fn search_nodes(&self, query: &str) -> Result<KnowledgeGraph, KgError> {
        let graph = self.load_graph().await?;
        let needle = query.to_lowercase();
        Ok(graph.subgraph(|e| e.matches_lowercase(&needle)))
    }

    async fn open_nodes(&self, names: &[String]) -> Result<KnowledgeGraph, KgError> {
        let graph = self.load_graph().await?;
        let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
        Ok(graph.subgraph(|e| wanted.contains(e.name.as_str())))
    }

    async fn create_entities(&self, entities: Vec<Entity>) -> Result<Vec<Entity>, KgError> {
        let created = self
            .mutate(|graph| {
                let existing: HashSet<String> =
                    graph.entities.iter().map(|e| e.name.clone()).collect();
                let new: Vec<Entity> = entities
                    .into_iter()
                    .filter(|e| !existing.contains(&e.name))
                    .collect();
                graph.entities.extend(new.iter().cloned());
                Ok(new)
            })
            .await?;
        tracing::info!(created = created.len(), "entities created");
        Ok(created)
    }

    async fn create_relations(&self, relations: Vec<Relation>) -> Result<Vec<Relation>, KgError> {
        let created = self
            .mutate(|graph| {
                let new: Vec<Relation> = relations
                    .into_iter()
                    .filter(|r| !graph.contains_relation(r))
                    .collect();
                graph.relations.extend(new.iter().cloned());
                Ok(new)
            })
            .await?;
        tracing::info!(created = created.len(), "relations created");
        Ok(created)
    }

    async fn add_observations(
        &self,
        updates: Vec<ObservationInput>,
    ) -> Result<Vec<ObservationResult>, KgError> {
        let results = self
            .mutate(|graph| {
                updates
                    .into_iter()
                    .map(|update| -> Result<ObservationResult, KgError> {
                        let entity = graph
                            .entity_mut(&update.entity_name)
                            .ok_or_else(|| KgError::NotFound(update.entity_name.clone()))?;
                        let added = entity.add_observations(&update.contents);
                        Ok(ObservationResult {
                            entity_name: update.entity_name,
                            added_observations: added,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .await?;
        tracing::info!(entities = results.len(), "observations added");
        Ok(results)
    }

    async fn delete_entities(&self, names: &[String]) -> Result<(), KgError> {
        let doomed: HashSet<&str> = names.iter().map(String::as_str).collect();
        self.mutate(|graph| {
            graph.entities.retain(|e| !doomed.contains(e.name.as_str()));
            graph
                .relations
                .retain(|r| !doomed.contains(r.from.as_str()) && !doomed.contains(r.to.as_str()));
            Ok(())
        })
        .await?;
        tracing::info!(requested = names.len(), "entities deleted");
        Ok(())
    }

    async fn delete_observations(&self, deletions: &[ObservationDeletion]) -> Result<(), KgError> {
        self.mutate(|graph| {
            for deletion in deletions {
                match graph.entity_mut(&deletion.entity_name) {
                    Some(entity) => entity.remove_observations(&deletion.observations),
                    None => {
                        tracing::debug!(entity = %deletion.entity_name, "skipping missing entity")
                    }
                }
            }
            Ok(())
        })
        .await?;
        tracing::info!(entities = deletions.len(), "observations deleted");
        Ok(())
    }

    async fn delete_relations(&self, relations: &[Relation]) -> Result<(), KgError> {
        let doomed: HashSet<&Relation> = relations.iter().collect();
        self.mutate(|graph| {
            graph.relations.retain(|r| !doomed.contains(r));
            Ok(())
        })
        .await?;
        tracing::info!(requested = relations.len(), "relations deleted");
        Ok(())
    }
}
