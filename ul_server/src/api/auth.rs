//! Authentication API handlers.
//!
//! Translates HTTP requests into [`AuthManager`] calls and typed errors
//! into envelope responses. No authentication decision is made here.
//!
//! # Examples
//!
//! Register a new user:
//! ```bash
//! curl -X POST http://localhost:8080/api/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "alice", "password": "Secret123!", "email": "a@x.com"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:8080/api/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "alice", "password": "Secret123!"}'
//! ```

use axum::{
    Json,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, header::USER_AGENT, request::Parts},
};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use user_login::auth::{AuthError, ClientInfo, LoginRequest, RegisterRequest};

use super::{ApiResponse, AppState};
use crate::logging;

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

type Envelope = (StatusCode, Json<ApiResponse>);

/// Client socket address, when the transport provides one.
///
/// Reads `ConnectInfo` out of the request extensions rather than requiring
/// it, so a router driven without connect info (as in tests) still resolves
/// handlers; extraction never fails.
pub struct ClientAddr(pub Option<SocketAddr>);

impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0),
        ))
    }
}

/// Map a manager error onto a status code and envelope.
fn error_response(err: &AuthError) -> Envelope {
    let status = match err {
        AuthError::Validation(_) | AuthError::DuplicateUsername => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredentials
        | AuthError::AccountLocked { .. }
        | AuthError::InvalidSession => StatusCode::UNAUTHORIZED,
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
        AuthError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::HashingFailed | AuthError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiResponse::err(err.client_message())))
}

/// Extract the bearer token from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, Envelope> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::err("Missing or malformed Authorization header")),
        ))
}

/// Request metadata for the audit trail.
fn client_info(headers: &HeaderMap, addr: Option<SocketAddr>) -> ClientInfo {
    ClientInfo {
        ip_address: addr.map(|a| a.ip().to_string()),
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

/// Register a new user account.
///
/// Returns `201 Created` with the new user's ID, `400 Bad Request` on
/// malformed input or a taken username.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Envelope {
    let request = RegisterRequest {
        username: payload.username,
        password: payload.password,
        email: payload.email,
    };

    match state.auth.register(request).await {
        Ok(user_id) => (
            StatusCode::CREATED,
            Json(ApiResponse::ok(
                "Registration successful",
                json!({ "user_id": user_id }),
            )),
        ),
        Err(err) => error_response(&err),
    }
}

/// Authenticate and issue a session token.
///
/// Returns `200 OK` with the token and its lifetime, `401 Unauthorized`
/// on bad credentials or an active lockout.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    addr: ClientAddr,
    Json(payload): Json<LoginPayload>,
) -> Envelope {
    let client = client_info(&headers, addr.0);
    let username = payload.username.clone();

    let request = LoginRequest {
        username: payload.username,
        password: payload.password,
    };

    match state.auth.login(request, client.clone()).await {
        Ok(session) => (
            StatusCode::OK,
            Json(ApiResponse::ok(
                "Login successful",
                json!({
                    "token": session.token,
                    "expires_in": state.auth.config().session_secs,
                    "user_id": session.user_id,
                    "username": session.username,
                }),
            )),
        ),
        Err(err) => {
            match &err {
                AuthError::AccountLocked { remaining_secs } => logging::log_security_event(
                    "account_locked",
                    &username,
                    client.ip_address.as_deref(),
                    &format!("login rejected, {remaining_secs}s of lockout remaining"),
                ),
                AuthError::InvalidCredentials => logging::log_security_event(
                    "failed_login",
                    &username,
                    client.ip_address.as_deref(),
                    "invalid credentials",
                ),
                _ => {}
            }
            error_response(&err)
        }
    }
}

/// Validate the bearer token and return its session.
pub async fn verify(State(state): State<AppState>, headers: HeaderMap) -> Envelope {
    let token = match bearer_token(&headers) {
        Ok(token) => token,
        Err(response) => return response,
    };

    match state.auth.verify(token).await {
        Ok(session) => (
            StatusCode::OK,
            Json(ApiResponse::ok(
                "Session valid",
                json!({
                    "user_id": session.user_id,
                    "username": session.username,
                    "expires_in": session.expires_in(),
                }),
            )),
        ),
        Err(err) => error_response(&err),
    }
}

/// Destroy the current session.
///
/// Idempotent: an already-absent or expired token still returns `200 OK`.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Envelope {
    let token = match bearer_token(&headers) {
        Ok(token) => token,
        Err(response) => return response,
    };

    match state.auth.logout(token).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::ok("Logged out", serde_json::Value::Null)),
        ),
        Err(err) => error_response(&err),
    }
}

/// Fetch the authenticated user's profile.
pub async fn user_info(State(state): State<AppState>, headers: HeaderMap) -> Envelope {
    let token = match bearer_token(&headers) {
        Ok(token) => token,
        Err(response) => return response,
    };

    match state.auth.fetch_profile(token).await {
        Ok(profile) => match serde_json::to_value(&profile) {
            Ok(data) => (StatusCode::OK, Json(ApiResponse::ok("User found", data))),
            Err(err) => error_response(&AuthError::Encoding(err)),
        },
        Err(err) => error_response(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::Request;

    async fn extract_addr(request: Request) -> ClientAddr {
        let (mut parts, _) = request.into_parts();
        ClientAddr::from_request_parts(&mut parts, &())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn client_addr_reads_connect_info_extension() {
        let addr: SocketAddr = "10.0.0.1:4242".parse().unwrap();
        let mut request = Request::new(Body::empty());
        request.extensions_mut().insert(ConnectInfo(addr));

        assert_eq!(extract_addr(request).await.0, Some(addr));
    }

    #[tokio::test]
    async fn client_addr_is_none_without_connect_info() {
        let request = Request::new(Body::empty());
        assert!(extract_addr(request).await.0.is_none());
    }

    #[test]
    fn client_info_maps_address_and_agent() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, "test-agent".parse().unwrap());

        let info = client_info(&headers, Some("10.0.0.1:4242".parse().unwrap()));
        assert_eq!(info.ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(info.user_agent.as_deref(), Some("test-agent"));

        let info = client_info(&HeaderMap::new(), None);
        assert!(info.ip_address.is_none());
        assert!(info.user_agent.is_none());
    }
}
