//! API integration tests, driving the router in-process over memory storage

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use bibliotheca_server::{
    api,
    config::{AppConfig, StorageBackend},
    repository::{MemoryStore, Repository},
    services::{loans::LoanPolicy, Library},
    AppState,
};

fn app_with_store() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let repository = Repository::new(store.clone(), "test_");
    let library = Library::new(repository, LoanPolicy::default());
    let mut config = AppConfig::default();
    config.storage.backend = StorageBackend::Memory;
    (
        api::create_router(AppState::new(config, library)),
        store,
    )
}

fn app() -> Router {
    app_with_store().0
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(format!("/api/v1{}", uri));
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, value)
}

async fn send_text(app: &Router, uri: &str, text: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1{}", uri))
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(text.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn register(app: &Router, title: &str, author: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/books",
        Some(json!({ "title": title, "author": author })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn test_health_check() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_register_and_list() {
    let app = app();
    let first = register(&app, "Title A", "Author A").await;
    register(&app, "Title B", "Author B").await;

    assert_eq!(first["sequence_number"], 1);
    assert_eq!(first["status"], "Available");

    let (status, body) = send(&app, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    let seqs: Vec<u64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["sequence_number"].as_u64().unwrap())
        .collect();
    assert_eq!(seqs, vec![1, 2]);

    let (_, body) = send(&app, Method::GET, "/books?q=author%20b", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Title B");

    let (_, body) = send(&app, Method::GET, "/books?q=nothing", None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["books"], 2);
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_register_requires_title() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/books",
        Some(json!({ "title": "  ", "author": "Someone" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_update_and_get() {
    let app = app();
    let book = register(&app, "Draft", "Someone").await;
    let id = book["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/books/{}", id),
        Some(json!({ "title": "Final", "author": "Someone", "year": 2001 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Final");
    assert_eq!(body["year"], "2001");
    assert_eq!(body["sequence_number"], 1);

    let (status, _) = send(&app, Method::GET, "/books/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_loan_lifecycle() {
    let app = app();
    let book = register(&app, "Title A", "Author A").await;
    let book_id = book["id"].as_str().unwrap().to_string();

    let (status, loan) = send(
        &app,
        Method::POST,
        "/loans",
        Some(json!({
            "book_id": book_id,
            "borrower_name": "Bob",
            "duration_days": 3,
            "initial_fee": "5.00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(loan["status"], "Active");
    let loan_id = loan["id"].as_str().unwrap().to_string();

    let (_, book) = send(&app, Method::GET, &format!("/books/{}", book_id), None).await;
    assert_eq!(book["status"], "OnLoan");

    // Second loan and deletion are both refused while lent
    let (status, _) = send(
        &app,
        Method::POST,
        "/loans",
        Some(json!({ "book_id": book_id, "borrower_name": "Eve", "duration_days": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(&app, Method::DELETE, &format!("/books/{}", book_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, available) = send(&app, Method::GET, "/books/available", None).await;
    assert!(available.as_array().unwrap().is_empty());

    let (_, details) = send(&app, Method::GET, &format!("/loans/{}", loan_id), None).await;
    assert_eq!(details["overdue_days"], 0);
    assert_eq!(details["is_overdue"], false);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/loans/{}/return", loan_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "returned");
    assert_eq!(body["loan"]["status"], "Returned");
    assert_eq!(body["loan"]["total_fine_charged"], "5.00");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/loans/{}/return", loan_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, active) = send(&app, Method::GET, "/loans?status=active", None).await;
    assert!(active.as_array().unwrap().is_empty());
    let (_, returned) = send(&app, Method::GET, "/loans?status=returned", None).await;
    assert_eq!(returned.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/books/{}", book_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_loan_unknown_book() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/loans",
        Some(json!({ "book_id": "ghost", "borrower_name": "Bob", "duration_days": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchBook");
}

#[tokio::test]
async fn test_import_export_round_trip() {
    let (app, store) = app_with_store();
    let catalog = json!([
        { "id": "b", "sequence_number": 9, "title": "Nine", "author": "N" },
        { "id": "a", "sequence_number": 4, "title": "Four", "author": "F" }
    ]);

    let (status, body) = send_text(&app, "/import/books", &catalog.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imported"], 2);
    assert!(store.get("test_books").await.is_some());
    assert_eq!(store.get("test_counter").await.as_deref(), Some("10"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/export/books")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"catalog_"));
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let exported: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(exported[0]["sequence_number"], 4);
    assert_eq!(exported[1]["sequence_number"], 9);

    let book = register(&app, "Ten", "T").await;
    assert_eq!(book["sequence_number"], 10);
}

#[tokio::test]
async fn test_oversized_loan_is_rejected() {
    let app = app();
    let book = register(&app, "Title A", "Author A").await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/loans",
        Some(json!({
            "book_id": book["id"],
            "borrower_name": "Bob",
            "duration_days": u32::MAX
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (_, book) = send(&app, Method::GET, &format!("/books/{}", book["id"].as_str().unwrap()), None).await;
    assert_eq!(book["status"], "Available");
}

#[tokio::test]
async fn test_malformed_import_is_rejected() {
    let app = app();
    register(&app, "Kept", "Someone").await;

    let (status, body) = send_text(&app, "/import/books", "{\"not\": \"a list\"}").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "MalformedImport");

    let (status, _) = send_text(&app, "/import/loans", "[{\"id\": 3}]").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, books) = send(&app, Method::GET, "/books", None).await;
    assert_eq!(books.as_array().unwrap().len(), 1);
}
