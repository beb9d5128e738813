//! Handler tests for the Users domain
//!
//! These tests verify that HTTP handlers work correctly:
//! - Request deserialization (JSON → Rust structs)
//! - Response serialization (Rust structs → JSON)
//! - HTTP status codes
//! - Error responses
//!
//! They run against the in-memory repository, so only the domain handlers
//! are exercised, not the full application with routing middleware.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain_users::*;
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt; // For oneshot()

fn app() -> axum::Router {
    let repository = InMemoryUserRepository::new();
    let service = UserService::new(repository);
    handlers::router(service)
}

fn signup_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/signup")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn list_request() -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri("/users")
        .body(Body::empty())
        .unwrap()
}

// Helper to parse JSON response body
async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_signup_handler_returns_201() {
    let app = app();

    let response = app
        .oneshot(signup_request(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "userName": "ada",
            "email": "ada@example.com",
            "password": "secret"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let user: User = json_body(response.into_body()).await;
    assert_eq!(user.id, 1);
    assert_eq!(user.user_name, "ada");
    assert_eq!(user.email, "ada@example.com");
}

#[tokio::test]
async fn test_signup_handler_preserves_email_casing() {
    let app = app();

    let response = app
        .oneshot(signup_request(json!({
            "userName": "ada",
            "email": "Ada@Example.COM",
            "password": "secret"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let user: User = json_body(response.into_body()).await;
    assert_eq!(user.email, "Ada@Example.COM");
}

#[tokio::test]
async fn test_signup_handler_rejects_duplicate_email_with_409() {
    let repository = InMemoryUserRepository::new();
    let service = UserService::new(repository);
    let app = handlers::router(service);

    let first = app
        .clone()
        .oneshot(signup_request(json!({
            "userName": "ada",
            "email": "A@B.com",
            "password": "secret"
        })))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    // Same email with different casing must be rejected
    let second = app
        .clone()
        .oneshot(signup_request(json!({
            "userName": "alan",
            "email": "a@b.com",
            "password": "secret"
        })))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let body_bytes = second.into_body().collect().await.unwrap().to_bytes();
    let body_str = String::from_utf8(body_bytes.to_vec()).unwrap();
    assert!(body_str.contains("A@B.com"));

    // The failed signup must not leave a record behind
    let response = app.oneshot(list_request()).await.unwrap();
    let users: Vec<User> = json_body(response.into_body()).await;
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn test_signup_handler_rejects_missing_email() {
    let app = app();

    let response = app
        .oneshot(signup_request(json!({
            "userName": "ada",
            "password": "secret"
        })))
        .await
        .unwrap();

    // Deserialization fails before the service runs
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_signup_handler_rejects_malformed_email() {
    let app = app();

    let response = app
        .oneshot(signup_request(json!({
            "userName": "ada",
            "email": "not-an-email",
            "password": "secret"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_users_handler_empty_store() {
    let app = app();

    let response = app.oneshot(list_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let users: Vec<User> = json_body(response.into_body()).await;
    assert!(users.is_empty());
}

#[tokio::test]
async fn test_list_users_handler_returns_saved_users() {
    let repository = InMemoryUserRepository::new();
    let service = UserService::new(repository);
    let app = handlers::router(service);

    for (user_name, email) in [("ada", "ada@example.com"), ("alan", "alan@example.com")] {
        let response = app
            .clone()
            .oneshot(signup_request(json!({
                "userName": user_name,
                "email": email,
                "password": "secret"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app.oneshot(list_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let users: Vec<User> = json_body(response.into_body()).await;
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].user_name, "ada");
    assert_eq!(users[1].user_name, "alan");
}

#[tokio::test]
async fn test_list_users_handler_is_stable_across_repeated_reads() {
    let repository = InMemoryUserRepository::new();
    let service = UserService::new(repository);
    let app = handlers::router(service);

    for (user_name, email) in [("ada", "ada@example.com"), ("alan", "alan@example.com")] {
        let response = app
            .clone()
            .oneshot(signup_request(json!({
                "userName": user_name,
                "email": email,
                "password": "secret"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // Listing must not mutate anything: two reads with no writes in
    // between return the same sequence
    let first = app.clone().oneshot(list_request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first_users: Vec<User> = json_body(first.into_body()).await;

    let second = app.oneshot(list_request()).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second_users: Vec<User> = json_body(second.into_body()).await;

    assert_eq!(first_users.len(), 2);
    assert_eq!(first_users, second_users);
}
