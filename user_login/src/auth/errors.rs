//! Authentication error types.

use thiserror::Error;

use crate::db::timeouts::TimeoutError;
use crate::kv::KvError;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed input, recoverable by the caller
    #[error("{0}")]
    Validation(String),

    /// Username already registered
    #[error("Username already exists")]
    DuplicateUsername,

    /// Wrong username or password; the two cases are indistinguishable
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Lockout active after repeated failures
    #[error("Account locked, try again in {remaining_secs} seconds")]
    AccountLocked { remaining_secs: u64 },

    /// Token not usable; absent and expired are reported identically
    #[error("Session invalid or expired")]
    InvalidSession,

    /// User row gone between session issuance and profile lookup
    #[error("User not found")]
    UserNotFound,

    /// Backing store timeout or connection failure
    #[error("Backing store unavailable: {0}")]
    StoreUnavailable(String),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Session payload could not be encoded
    #[error("Session encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak internal details.
    ///
    /// Store and encoding errors are sanitized so connection strings and
    /// payload structure never reach a caller.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::StoreUnavailable(_) => "Service temporarily unavailable".to_string(),
            AuthError::HashingFailed | AuthError::Encoding(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::DuplicateUsername,
            _ => AuthError::StoreUnavailable(err.to_string()),
        }
    }
}

impl From<TimeoutError> for AuthError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(d) => {
                AuthError::StoreUnavailable(format!("query timed out after {d:?}"))
            }
            TimeoutError::Database(e) => AuthError::from(e),
        }
    }
}

impl From<KvError> for AuthError {
    fn from(err: KvError) -> Self {
        AuthError::StoreUnavailable(err.to_string())
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
