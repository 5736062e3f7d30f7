//! Axum server and routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use kg_types::{
    AddObservationsRequest, ApiResponse, CreateEntitiesRequest, DeleteEntitiesRequest,
    DeleteObservationsRequest, Entity, KgError, KnowledgeGraph, KnowledgeGraphService,
    ObservationResult, OpenNodesRequest, Relation, RelationsRequest, SearchNodesRequest,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub struct AppState {
    pub service: Arc<dyn KnowledgeGraphService>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/graph", get(handle_read_graph))
        .route("/graph/search", post(handle_search_nodes))
        .route("/graph/open", post(handle_open_nodes))
        .route("/entities", post(handle_create_entities))
        .route("/entities/delete", post(handle_delete_entities))
        .route("/relations", post(handle_create_relations))
        .route("/relations/delete", post(handle_delete_relations))
        .route("/observations", post(handle_add_observations))
        .route("/observations/delete", post(handle_delete_observations))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

fn status_for(err: &KgError) -> StatusCode {
    match err {
        KgError::Validation(_) => StatusCode::BAD_REQUEST,
        KgError::NotFound(_) => StatusCode::NOT_FOUND,
        KgError::Storage(_) | KgError::Serialization(_) | KgError::Backend(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn reply<T: Serialize>(op: &'static str, result: Result<T, KgError>) -> Reply<T> {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                tracing::error!(op, error = %e, "graph operation failed");
            } else {
                tracing::warn!(op, error = %e, "graph request rejected");
            }
            (status, Json(ApiResponse::error(status.as_u16(), e.to_string())))
        }
    }
}

fn bad_body<T>(op: &'static str, rejection: JsonRejection) -> Reply<T> {
    tracing::warn!(op, error = %rejection.body_text(), "malformed request body");
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(
            StatusCode::BAD_REQUEST.as_u16(),
            rejection.body_text(),
        )),
    )
}

async fn handle_read_graph(State(state): State<Arc<AppState>>) -> Reply<KnowledgeGraph> {
    reply("read_graph", state.service.read_graph().await)
}

async fn handle_search_nodes(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SearchNodesRequest>, JsonRejection>,
) -> Reply<KnowledgeGraph> {
    match body {
        Ok(Json(req)) => reply("search_nodes", state.service.search_nodes(&req.query).await),
        Err(rejection) => bad_body("search_nodes", rejection),
    }
}

async fn handle_open_nodes(
    State(state): State<Arc<AppState>>,
    body: Result<Json<OpenNodesRequest>, JsonRejection>,
) -> Reply<KnowledgeGraph> {
    match body {
        Ok(Json(req)) => reply("open_nodes", state.service.open_nodes(&req.names).await),
        Err(rejection) => bad_body("open_nodes", rejection),
    }
}

async fn handle_create_entities(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateEntitiesRequest>, JsonRejection>,
) -> Reply<Vec<Entity>> {
    match body {
        Ok(Json(req)) => reply(
            "create_entities",
            state.service.create_entities(req.entities).await,
        ),
        Err(rejection) => bad_body("create_entities", rejection),
    }
}

async fn handle_delete_entities(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DeleteEntitiesRequest>, JsonRejection>,
) -> Reply<()> {
    match body {
        Ok(Json(req)) => reply(
            "delete_entities",
            state.service.delete_entities(&req.entity_names).await,
        ),
        Err(rejection) => bad_body("delete_entities", rejection),
    }
}

async fn handle_create_relations(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RelationsRequest>, JsonRejection>,
) -> Reply<Vec<Relation>> {
    match body {
        Ok(Json(req)) => reply(
            "create_relations",
            state.service.create_relations(req.relations).await,
        ),
        Err(rejection) => bad_body("create_relations", rejection),
    }
}

async fn handle_delete_relations(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RelationsRequest>, JsonRejection>,
) -> Reply<()> {
    match body {
        Ok(Json(req)) => reply(
            "delete_relations",
            state.service.delete_relations(&req.relations).await,
        ),
        Err(rejection) => bad_body("delete_relations", rejection),
    }
}

async fn handle_add_observations(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AddObservationsRequest>, JsonRejection>,
) -> Reply<Vec<ObservationResult>> {
    match body {
        Ok(Json(req)) => reply(
            "add_observations",
            state.service.add_observations(req.observations).await,
        ),
        Err(rejection) => bad_body("add_observations", rejection),
    }
}

async fn handle_delete_observations(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DeleteObservationsRequest>, JsonRejection>,
) -> Reply<()> {
    match body {
        Ok(Json(req)) => reply(
            "delete_observations",
            state.service.delete_observations(&req.deletions).await,
        ),
        Err(rejection) => bad_body("delete_observations", rejection),
    }
}

async fn handle_health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::ok("ok"))
}
