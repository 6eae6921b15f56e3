//! Authentication module providing user registration, login, and session management.
//!
//! This module implements the session and lockout manager:
//! - Argon2id password hashing with a server-side pepper
//! - Opaque UUIDv4 session tokens stored in the key-value backing store
//! - Per-username failed-login counters with TTL-based lockout
//! - Append-only login audit trail
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use user_login::auth::{AuthConfig, AuthManager, LoginRequest, RegisterRequest};
//! use user_login::db::repository::memory::InMemoryUserRepository;
//! use user_login::kv::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let auth = AuthManager::new(
//!         Arc::new(InMemoryUserRepository::new()),
//!         Arc::new(MemoryStore::new()),
//!         "pepper".to_string(),
//!         AuthConfig::default(),
//!     );
//!
//!     auth.register(RegisterRequest {
//!         username: "alice".to_string(),
//!         password: "Secret123!".to_string(),
//!         email: None,
//!     })
//!     .await?;
//!
//!     let session = auth
//!         .login(
//!             LoginRequest {
//!                 username: "alice".to_string(),
//!                 password: "Secret123!".to_string(),
//!             },
//!             Default::default(),
//!         )
//!         .await?;
//!     println!("logged in, token: {}", session.token);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{AuthError, AuthResult};
pub use manager::{AuthConfig, AuthManager};
pub use models::{
    ClientInfo, LoginAttemptLog, LoginRequest, LoginStatus, RegisterRequest, Session, UserId,
    UserProfile, UserRecord,
};
