//! # user_login
//!
//! A username/password authentication library built around two backing stores:
//! a relational store for durable user records and a key-value store with
//! per-entry TTLs for transient session and lockout state.
//!
//! ## Core Modules
//!
//! - [`auth`]: the session and lockout manager — registration, login gating,
//!   token issuance/verification/revocation, profile lookup
//! - [`db`]: the credential store — PostgreSQL connection pooling, the
//!   `UserRepository` seam, and bounded query timeouts
//! - [`kv`]: the key-value backing store seam and an in-process
//!   implementation with lazy TTL expiry
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use user_login::auth::{AuthConfig, AuthManager, RegisterRequest};
//! use user_login::db::{Database, DatabaseConfig, PgUserRepository};
//! use user_login::kv::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::default()).await?;
//!     let auth = AuthManager::new(
//!         Arc::new(PgUserRepository::new(db.pool().clone())),
//!         Arc::new(MemoryStore::new()),
//!         "server_side_pepper".to_string(),
//!         AuthConfig::default(),
//!     );
//!
//!     let user_id = auth
//!         .register(RegisterRequest {
//!             username: "alice".to_string(),
//!             password: "Secret123!".to_string(),
//!             email: Some("a@x.com".to_string()),
//!         })
//!         .await?;
//!     println!("registered user {user_id}");
//!     Ok(())
//! }
//! ```

/// Session and lockout management.
pub mod auth;
pub use auth::{AuthConfig, AuthError, AuthManager, AuthResult, Session};

/// Relational credential store.
pub mod db;
pub use db::{Database, DatabaseConfig, PgUserRepository, UserRepository};

/// Key-value backing store for counters and session records.
pub mod kv;
pub use kv::{KeyValueStore, MemoryStore};
