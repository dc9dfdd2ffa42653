//! Integration tests against a real PostgreSQL database.
//!
//! These tests require a reachable DATABASE_URL environment variable.
//! Run with: cargo test --test integration -- --ignored
//!
//! The `todos` table is created if missing. Tests only touch rows they
//! inserted, so they can share a database with other data.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use todo_service::api::{create_router, AppState};
use todo_service::error::RepositoryError;
use todo_service::repository::{PgTodoRepository, TodoRepository};
use todo_service::todo::NewTodo;

/// Connect to the test database, or None when DATABASE_URL is unset.
async fn test_repository() -> Option<PgTodoRepository> {
    dotenvy::dotenv().ok();

    let url = std::env::var("DATABASE_URL").ok()?;
    if url.is_empty() {
        return None;
    }

    let pool = sqlx::PgPool::connect(&url).await.ok()?;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS todos (id BIGINT PRIMARY KEY, name TEXT, age BIGINT, data TEXT)",
    )
    .execute(&pool)
    .await
    .ok()?;

    PgTodoRepository::with_pool(pool).await.ok()
}

macro_rules! repository_or_skip {
    () => {
        match test_repository().await {
            Some(r) => r,
            None => {
                println!("Skipping: DATABASE_URL not set or unreachable");
                return;
            }
        }
    };
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_and_get() {
    let repo = repository_or_skip!();

    let created = repo
        .create(NewTodo::new("buy milk", 0, "urgent"))
        .await
        .expect("insert failed");
    assert!(created.id > 0);

    let fetched = repo.get_by_id(created.id).await.expect("select failed");
    assert_eq!(fetched, created);

    repo.delete(created.id).await.expect("cleanup failed");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_ids_exceed_existing_rows() {
    let repo = repository_or_skip!();

    let first = repo.create(NewTodo::new("a", 1, "")).await.unwrap();

    // A second repository over the same table must not reuse ids.
    let second_repo = PgTodoRepository::with_pool(repo.pool().clone())
        .await
        .unwrap();
    let second = second_repo.create(NewTodo::new("b", 2, "")).await.unwrap();
    assert!(second.id > first.id);

    repo.delete(first.id).await.unwrap();
    repo.delete(second.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_get_all_contains_created() {
    let repo = repository_or_skip!();

    let created = repo.create(NewTodo::new("listed", 4, "x")).await.unwrap();
    let all = repo.get_all().await.unwrap();

    assert!(all.iter().any(|todo| todo == &created));
    assert!(all.windows(2).all(|pair| pair[0].id < pair[1].id));

    repo.delete(created.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_replaces_record() {
    let repo = repository_or_skip!();

    let created = repo.create(NewTodo::new("before", 1, "old")).await.unwrap();
    let replacement = NewTodo::new("after", 2, "").with_id(created.id);

    repo.update(&replacement).await.unwrap();
    assert_eq!(repo.get_by_id(created.id).await.unwrap(), replacement);

    repo.delete(created.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_missing_ids_are_not_found() {
    let repo = repository_or_skip!();

    // Negative ids are never issued.
    let ghost = NewTodo::new("ghost", 0, "").with_id(-1);

    assert!(matches!(
        repo.get_by_id(-1).await,
        Err(RepositoryError::NotFound(-1))
    ));
    assert!(matches!(
        repo.update(&ghost).await,
        Err(RepositoryError::NotFound(-1))
    ));
    assert!(matches!(
        repo.delete(-1).await,
        Err(RepositoryError::NotFound(-1))
    ));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_http_round_trip() {
    let repo = repository_or_skip!();
    let app = create_router(AppState::new(Arc::new(repo)));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/todo")
        .body(Body::from(r#"{"name":"buy milk","age":0,"data":"urgent"}"#))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let id = serde_json::from_slice::<Value>(&body).unwrap()["id"]
        .as_i64()
        .unwrap();

    let request = Request::builder()
        .uri(format!("/todo?id={id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(
        serde_json::from_slice::<Value>(&body).unwrap(),
        json!({ "id": id, "name": "buy milk", "age": 0, "data": "urgent" })
    );

    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/todo?id={id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/todo?id={id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
