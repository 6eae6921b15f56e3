//! Integration tests for the HTTP API.
//!
//! Drives the full router over in-process backends: envelope shape,
//! status mapping, bearer-token handling, and the lockout flow end to end.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use ul_server::api::{AppState, create_router};
use user_login::auth::{AuthConfig, AuthManager};
use user_login::db::repository::memory::InMemoryUserRepository;
use user_login::kv::MemoryStore;

fn test_app() -> Router {
    test_app_with(AuthConfig {
        max_attempts: 3,
        lock_secs: 900,
        session_secs: 3600,
    })
}

fn test_app_with(config: AuthConfig) -> Router {
    let auth = Arc::new(AuthManager::new(
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(MemoryStore::new()),
        "api_test_pepper".to_string(),
        config,
    ));
    create_router(AppState { auth })
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn bearer_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn envelope(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).expect("response body should be a JSON envelope")
}

async fn register_alice(app: &Router) -> i64 {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/register",
            json!({"username": "alice", "password": "Secret123!", "email": "a@x.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = envelope(response).await;
    assert_eq!(body["success"], json!(true));
    body["data"]["user_id"].as_i64().expect("numeric user id")
}

async fn login_alice(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            json!({"username": "alice", "password": "Secret123!"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = envelope(response).await;
    assert_eq!(body["success"], json!(true));
    body["data"]["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn health_check_returns_envelope() {
    let app = test_app();

    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = envelope(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["status"], json!("healthy"));
}

#[tokio::test]
async fn register_then_duplicate() {
    let app = test_app();
    register_alice(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/register",
            json!({"username": "alice", "password": "Another123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = envelope(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn register_rejects_weak_password() {
    let app = test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/register",
            json!({"username": "alice", "password": "weak"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = envelope(response).await;
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn login_and_verify_flow() {
    let app = test_app();
    let user_id = register_alice(&app).await;
    let token = login_alice(&app).await;

    let response = app
        .clone()
        .oneshot(bearer_request("GET", "/api/verify", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = envelope(response).await;
    assert_eq!(body["data"]["user_id"], json!(user_id));
    assert_eq!(body["data"]["username"], json!("alice"));
    assert!(body["data"]["expires_in"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn wrong_credentials_are_uniform_401() {
    let app = test_app();
    register_alice(&app).await;

    let wrong_password = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            json!({"username": "alice", "password": "Wrong123!"}),
        ))
        .await
        .unwrap();
    let unknown_user = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            json!({"username": "nobody", "password": "Wrong123!"}),
        ))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    // Identical envelopes: no username-existence leak.
    let a = envelope(wrong_password).await;
    let b = envelope(unknown_user).await;
    assert_eq!(a["message"], b["message"]);
}

#[tokio::test]
async fn lockout_over_http() {
    let app = test_app(); // max_attempts = 3

    register_alice(&app).await;

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/login",
                json!({"username": "alice", "password": "Wrong123!"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Correct password while locked is still a 401, and the message says
    // locked rather than invalid credentials.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            json!({"username": "alice", "password": "Secret123!"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = envelope(response).await;
    assert!(
        body["message"].as_str().unwrap().contains("locked"),
        "message should mention the lockout: {body}"
    );
}

#[tokio::test]
async fn verify_without_bearer_header() {
    let app = test_app();

    let request = Request::builder()
        .uri("/api/verify")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Wrong scheme is also rejected.
    let request = Request::builder()
        .uri("/api/verify")
        .header(header::AUTHORIZATION, "Basic abc123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_is_idempotent_over_http() {
    let app = test_app();
    register_alice(&app).await;
    let token = login_alice(&app).await;

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(bearer_request("POST", "/api/logout", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = envelope(response).await;
        assert_eq!(body["success"], json!(true));
    }

    // Token is gone after logout.
    let response = app
        .clone()
        .oneshot(bearer_request("GET", "/api/verify", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_info_returns_profile_without_hash() {
    let app = test_app();
    let user_id = register_alice(&app).await;
    let token = login_alice(&app).await;

    let response = app
        .clone()
        .oneshot(bearer_request("GET", "/api/user/info", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = envelope(response).await;
    assert_eq!(body["data"]["id"], json!(user_id));
    assert_eq!(body["data"]["username"], json!("alice"));
    assert_eq!(body["data"]["email"], json!("a@x.com"));
    assert!(body["data"].get("password_hash").is_none());

    // Invalid token gets the uniform invalid-session response.
    let response = app
        .oneshot(bearer_request("GET", "/api/user/info", "bogus"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn responses_carry_request_id_header() {
    let app = test_app();

    let request = Request::builder()
        .uri("/api/health")
        .header("x-request-id", "fixed-id-1")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "fixed-id-1"
    );

    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
