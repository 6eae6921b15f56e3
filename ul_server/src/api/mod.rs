//! HTTP API for the authentication service.
//!
//! Exposes exactly six operations over JSON:
//!
//! - `POST /api/register` - Create an account (public)
//! - `POST /api/login` - Login with credentials (public)
//! - `GET  /api/verify` - Validate a bearer token
//! - `POST /api/logout` - Destroy the current session (idempotent)
//! - `GET  /api/user/info` - Fetch the authenticated user's profile
//! - `GET  /api/health` - Reachability probe
//!
//! Every response, success or failure, carries the uniform envelope
//! `{"success": bool, "message": string, "data": object|null}`.

pub mod auth;
pub mod request_id;

use axum::{
    Router,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use user_login::auth::AuthManager;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; cheap due to the Arc wrapper.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthManager>,
}

/// Uniform JSON response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    pub data: Value,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: Value::Null,
        }
    }
}

/// Create the API router with all endpoints and middleware.
///
/// # Arguments
///
/// - `state`: Application state with the auth manager
///
/// # Returns
///
/// Configured Axum router ready to serve requests
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/verify", get(auth::verify))
        .route("/api/logout", post(auth::logout))
        .route("/api/user/info", get(auth::user_info))
        .route("/api/health", get(health_check))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Reachability probe for monitoring and load balancers.
///
/// Deliberately a no-op: it confirms the process is serving requests and
/// nothing more. Store connectivity problems surface on the real endpoints
/// as 503 responses.
async fn health_check() -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::OK,
        Json(ApiResponse::ok(
            "Service healthy",
            json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }),
        )),
    )
}
