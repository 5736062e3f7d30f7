//! Request and response DTOs for the HTTP adapter.

use crate::{Entity, ObservationDeletion, ObservationInput, Relation};
use serde::{Deserialize, Serialize};

/// Envelope for every adapter response. `code` mirrors the HTTP status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 200,
            message: "Success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchNodesRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenNodesRequest {
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEntitiesRequest {
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEntitiesRequest {
    pub entity_names: Vec<String>,
}

/// Body for both creating and deleting relations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationsRequest {
    pub relations: Vec<Relation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddObservationsRequest {
    pub observations: Vec<ObservationInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteObservationsRequest {
    pub deletions: Vec<ObservationDeletion>,
}
