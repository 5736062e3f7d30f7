//! Entities, relations, and the graph that holds them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named node with a type tag and an ordered list of observations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Unique key within the graph.
    pub name: String,
    pub entity_type: String,
    /// Free-text facts, in insertion order.
    pub observations: Vec<String>,
}

impl Entity {
    pub fn new(
        name: impl Into<String>,
        entity_type: impl Into<String>,
        observations: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            observations,
        }
    }

    /// Case-insensitive substring match on name, type, or any observation.
    /// `needle` must already be lowercased.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.entity_type.to_lowercase().contains(needle)
            || self
                .observations
                .iter()
                .any(|o| o.to_lowercase().contains(needle))
    }

    /// Append every observation not already present; returns the ones appended.
    ///
    /// Presence is checked against the entity as it was before the call, so
    /// duplicates inside `contents` are appended more than once.
    pub fn add_observations(&mut self, contents: &[String]) -> Vec<String> {
        let added: Vec<String> = contents
            .iter()
            .filter(|c| !self.observations.contains(c))
            .cloned()
            .collect();
        self.observations.extend(added.iter().cloned());
        added
    }

    /// Drop every observation equal to one of `texts`.
    pub fn remove_observations(&mut self, texts: &[String]) {
        self.observations.retain(|o| !texts.contains(o));
    }
}

/// A directed, typed edge between two entity names.
///
/// Identity is the full `(from, to, relation_type)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub from: String,
    pub to: String,
    pub relation_type: String,
}

impl Relation {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        relation_type: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            relation_type: relation_type.into(),
        }
    }
}

/// The full collection of entities and relations; the unit of persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }

    pub fn entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.name == name)
    }

    pub fn contains_relation(&self, relation: &Relation) -> bool {
        self.relations.iter().any(|r| r == relation)
    }

    /// Keep the entities accepted by `keep`, plus the relations whose
    /// endpoints are both among the kept entities.
    pub fn subgraph<F>(&self, mut keep: F) -> KnowledgeGraph
    where
        F: FnMut(&Entity) -> bool,
    {
        let entities: Vec<Entity> = self.entities.iter().filter(|e| keep(*e)).cloned().collect();
        let names: HashSet<&str> = entities.iter().map(|e| e.name.as_str()).collect();
        let relations = self
            .relations
            .iter()
            .filter(|r| names.contains(r.from.as_str()) && names.contains(r.to.as_str()))
            .cloned()
            .collect();
        KnowledgeGraph {
            entities,
            relations,
        }
    }
}

/// Observations to append to one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationInput {
    pub entity_name: String,
    pub contents: Vec<String>,
}

/// Observations actually appended to one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationResult {
    pub entity_name: String,
    pub added_observations: Vec<String>,
}

/// Observations to remove from one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationDeletion {
    pub entity_name: String,
    pub observations: Vec<String>,
}
