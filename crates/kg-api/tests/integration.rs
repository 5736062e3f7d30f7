//! Integration tests: every route end to end over a JSONL file.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use kg_api::server::{self, AppState};
use kg_graph::{JsonlGraphStorage, KnowledgeGraphManager};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower::util::ServiceExt;

fn test_app(path: PathBuf) -> axum::Router {
    let service = Arc::new(KnowledgeGraphManager::new(JsonlGraphStorage::new(path)));
    server::router(Arc::new(AppState { service }))
}

async fn call(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn create_then_open_and_read_back_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.jsonl");
    let app = test_app(path.clone());

    let (status, j) = call(
        &app,
        "POST",
        "/entities",
        Some(json!({ "entities": [
            { "name": "Alice", "entityType": "person", "observations": ["likes tea"] }
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(j["code"], 200);
    assert_eq!(j["data"][0]["name"], "Alice");

    let (_, j) = call(&app, "POST", "/graph/open", Some(json!({ "names": ["Alice", "Bob"] }))).await;
    assert_eq!(j["data"]["entities"].as_array().unwrap().len(), 1);
    assert_eq!(j["data"]["relations"], json!([]));

    let on_disk = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        on_disk.trim(),
        r#"{"type":"entity","name":"Alice","entityType":"person","observations":["likes tea"]}"#
    );
}

#[tokio::test]
async fn relations_search_and_cascade() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path().join("memory.jsonl"));

    call(
        &app,
        "POST",
        "/entities",
        Some(json!({ "entities": [
            { "name": "Alice", "entityType": "person", "observations": ["tea"] },
            { "name": "Bob", "entityType": "person", "observations": ["TEA too"] },
            { "name": "Carol", "entityType": "person", "observations": [] }
        ]})),
    )
    .await;
    let rels = json!({ "relations": [
        { "from": "Alice", "to": "Bob", "relationType": "knows" },
        { "from": "Carol", "to": "Alice", "relationType": "knows" }
    ]});
    let (_, j) = call(&app, "POST", "/relations", Some(rels.clone())).await;
    assert_eq!(j["data"].as_array().unwrap().len(), 2);
    let (_, j) = call(&app, "POST", "/relations", Some(rels)).await;
    assert_eq!(j["data"], json!([]));

    let (_, j) = call(&app, "POST", "/graph/search", Some(json!({ "query": "tea" }))).await;
    assert_eq!(j["data"]["entities"].as_array().unwrap().len(), 2);
    assert_eq!(
        j["data"]["relations"],
        json!([{ "from": "Alice", "to": "Bob", "relationType": "knows" }])
    );

    let (status, _) = call(
        &app,
        "POST",
        "/entities/delete",
        Some(json!({ "entityNames": ["Alice"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, j) = call(&app, "GET", "/graph", None).await;
    assert_eq!(j["data"]["entities"].as_array().unwrap().len(), 2);
    assert_eq!(j["data"]["relations"], json!([]));
}

#[tokio::test]
async fn observations_round_trip_and_missing_entity_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.jsonl");
    let app = test_app(path.clone());

    let (status, j) = call(
        &app,
        "POST",
        "/observations",
        Some(json!({ "observations": [{ "entityName": "Ghost", "contents": ["x"] }] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(j["code"], 404);
    assert!(j["message"].as_str().unwrap().contains("Ghost"));
    assert!(!path.exists());

    call(
        &app,
        "POST",
        "/entities",
        Some(json!({ "entities": [{ "name": "Alice", "entityType": "person", "observations": [] }] })),
    )
    .await;
    let (_, j) = call(
        &app,
        "POST",
        "/observations",
        Some(json!({ "observations": [{ "entityName": "Alice", "contents": ["a", "b"] }] })),
    )
    .await;
    assert_eq!(
        j["data"],
        json!([{ "entityName": "Alice", "addedObservations": ["a", "b"] }])
    );

    // Missing entities are skipped on delete.
    let (status, _) = call(
        &app,
        "POST",
        "/observations/delete",
        Some(json!({ "deletions": [
            { "entityName": "Ghost", "observations": ["x"] },
            { "entityName": "Alice", "observations": ["a"] }
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, j) = call(&app, "GET", "/graph", None).await;
    assert_eq!(j["data"]["entities"][0]["observations"], json!(["b"]));
}

#[tokio::test]
async fn malformed_bodies_are_validation_errors() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path().join("memory.jsonl"));

    let (status, j) = call(
        &app,
        "POST",
        "/entities",
        Some(json!({ "entities": [{ "name": "Alice", "observations": "nope" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(j["code"], 400);

    let (status, j) = call(
        &app,
        "POST",
        "/relations",
        Some(json!({ "relations": [{ "from": "A", "to": ["B"], "relationType": "knows" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(j["code"], 400);
}

#[tokio::test]
async fn empty_strings_are_accepted_and_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path().join("memory.jsonl"));

    let (status, j) = call(
        &app,
        "POST",
        "/entities",
        Some(json!({ "entities": [{ "name": "Alice", "entityType": "", "observations": [""] }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(j["data"][0]["entityType"], "");

    let (status, _) = call(
        &app,
        "POST",
        "/relations/delete",
        Some(json!({ "relations": [{ "from": "", "to": "B", "relationType": "knows" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, j) = call(&app, "GET", "/graph", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(j["data"]["entities"][0]["name"], "Alice");
}

#[tokio::test]
async fn corrupt_storage_surfaces_as_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.jsonl");
    std::fs::write(&path, "{\"type\":\"widget\"}\n").unwrap();
    let app = test_app(path);

    let (status, j) = call(&app, "GET", "/graph", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(j["message"].as_str().unwrap().contains("line 1"));
}

#[tokio::test]
async fn health() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path().join("memory.jsonl"));
    let (status, j) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(j["data"], "ok");
}
