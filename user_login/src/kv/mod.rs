//! Key-value backing store abstraction for session and lockout state.
//!
//! The manager owns exactly two key shapes in this store:
//! - `attempts:{username}` — failed-login counter, TTL = lock duration
//! - `session:{token}` — serialized [`Session`](crate::auth::Session),
//!   TTL = session duration
//!
//! Expiry is the store's responsibility and is lazy: a key whose TTL has
//! elapsed is indistinguishable from one that never existed. No background
//! sweep is required by callers.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub mod memory;

pub use memory::MemoryStore;

/// Key-value store errors
#[derive(Debug, Error)]
pub enum KvError {
    /// Store timeout or connection failure
    #[error("key-value store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for key-value store operations
pub type KvResult<T> = Result<T, KvError>;

/// Trait for the key-value store backing sessions and lockout counters.
///
/// Implementations must provide per-key TTL semantics: an entry past its TTL
/// reads as absent. `incr_with_ttl` must be atomic relative to concurrent
/// increments of the same key; single-key get/set/delete need no additional
/// coordination beyond what the store provides natively.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value; expired entries read as `None`.
    async fn get(&self, key: &str) -> KvResult<Option<String>>;

    /// Write a value with a TTL, replacing any existing entry.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> KvResult<()>;

    /// Remove an entry. Returns whether a live entry was present.
    async fn delete(&self, key: &str) -> KvResult<bool>;

    /// Atomically increment an integer counter and return the new value.
    ///
    /// Creates the counter at 1 if absent or expired. The TTL is refreshed
    /// on every increment, so the counter lives `ttl` past the last failure.
    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> KvResult<i64>;

    /// Remaining lifetime of an entry, or `None` if absent or expired.
    async fn ttl(&self, key: &str) -> KvResult<Option<Duration>>;
}

/// Key for the per-username failed-login counter.
pub fn attempts_key(username: &str) -> String {
    format!("attempts:{username}")
}

/// Key for a stored session record.
pub fn session_key(token: &str) -> String {
    format!("session:{token}")
}
