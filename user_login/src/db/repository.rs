//! Repository trait for the credential store.
//!
//! Trait-based abstraction over user-row storage, enabling dependency
//! injection into the session manager and an in-process backend for tests
//! and demos. The PostgreSQL implementation relies on the database's unique
//! constraint on `username` as the sole serialization point for concurrent
//! registrations: the second insert is rejected and surfaced as
//! `DuplicateUsername`.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::auth::{AuthResult, LoginAttemptLog, UserId, UserRecord};
use crate::db::timeouts::with_default_timeout;

/// Trait for credential-store operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user row; fails with `DuplicateUsername` if taken
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        email: Option<&str>,
    ) -> AuthResult<UserId>;

    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserRecord>>;

    /// Find a user by ID
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<UserRecord>>;

    /// Append one row to the login audit trail
    async fn record_login_attempt(&self, attempt: &LoginAttemptLog) -> AuthResult<()>;
}

/// PostgreSQL implementation of [`UserRepository`]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: sqlx::postgres::PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        email: row.get("email"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        email: Option<&str>,
    ) -> AuthResult<UserId> {
        let row = with_default_timeout(
            sqlx::query(
                "INSERT INTO users (username, password_hash, email)
                 VALUES ($1, $2, $3)
                 RETURNING id",
            )
            .bind(username)
            .bind(password_hash)
            .bind(email)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(row.get("id"))
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserRecord>> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT id, username, password_hash, email, created_at, updated_at
                 FROM users WHERE username = $1",
            )
            .bind(username)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(record_from_row))
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<UserRecord>> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT id, username, password_hash, email, created_at, updated_at
                 FROM users WHERE id = $1",
            )
            .bind(user_id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(record_from_row))
    }

    async fn record_login_attempt(&self, attempt: &LoginAttemptLog) -> AuthResult<()> {
        with_default_timeout(
            sqlx::query(
                "INSERT INTO login_logs (user_id, username, ip_address, user_agent, status, message)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(attempt.user_id)
            .bind(&attempt.username)
            .bind(&attempt.ip_address)
            .bind(&attempt.user_agent)
            .bind(attempt.status.as_str())
            .bind(&attempt.message)
            .execute(&self.pool),
        )
        .await?;

        Ok(())
    }
}

/// In-process implementation backed by hash maps.
///
/// Used by the test suites and usable as a standalone backend for demos;
/// enforces the same username-uniqueness contract as the SQL store.
pub mod memory {
    use super::*;
    use crate::auth::AuthError;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Inner {
        users: HashMap<UserId, UserRecord>,
        log: Vec<LoginAttemptLog>,
        next_id: UserId,
    }

    /// In-memory [`UserRepository`]
    #[derive(Default)]
    pub struct InMemoryUserRepository {
        inner: Mutex<Inner>,
    }

    impl InMemoryUserRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Snapshot of the audit trail, oldest first.
        pub fn login_log(&self) -> Vec<LoginAttemptLog> {
            self.inner.lock().expect("repository lock poisoned").log.clone()
        }
    }

    #[async_trait]
    impl UserRepository for InMemoryUserRepository {
        async fn create_user(
            &self,
            username: &str,
            password_hash: &str,
            email: Option<&str>,
        ) -> AuthResult<UserId> {
            let mut inner = self.inner.lock().expect("repository lock poisoned");
            if inner.users.values().any(|u| u.username == username) {
                return Err(AuthError::DuplicateUsername);
            }

            inner.next_id += 1;
            let id = inner.next_id;
            let now = Utc::now();
            inner.users.insert(
                id,
                UserRecord {
                    id,
                    username: username.to_string(),
                    password_hash: password_hash.to_string(),
                    email: email.map(str::to_string),
                    created_at: now,
                    updated_at: now,
                },
            );
            Ok(id)
        }

        async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserRecord>> {
            let inner = self.inner.lock().expect("repository lock poisoned");
            Ok(inner
                .users
                .values()
                .find(|u| u.username == username)
                .cloned())
        }

        async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<UserRecord>> {
            let inner = self.inner.lock().expect("repository lock poisoned");
            Ok(inner.users.get(&user_id).cloned())
        }

        async fn record_login_attempt(&self, attempt: &LoginAttemptLog) -> AuthResult<()> {
            let mut inner = self.inner.lock().expect("repository lock poisoned");
            inner.log.push(attempt.clone());
            Ok(())
        }
    }

}
