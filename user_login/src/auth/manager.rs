//! Session and lockout manager implementation.

use super::{
    errors::{AuthError, AuthResult},
    models::{
        ClientInfo, LoginAttemptLog, LoginRequest, LoginStatus, RegisterRequest, Session, UserId,
        UserProfile,
    },
};
use crate::db::UserRepository;
use crate::kv::{KeyValueStore, attempts_key, session_key};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Lockout and session parameters, fixed at construction
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Failed attempts before the account locks
    pub max_attempts: u32,

    /// Lock duration in seconds; also the failure-counter TTL
    pub lock_secs: u64,

    /// Session lifetime in seconds
    pub session_secs: u64,
}

impl AuthConfig {
    /// Load parameters from environment variables
    ///
    /// - `MAX_LOGIN_ATTEMPTS` (default: 5)
    /// - `LOCK_TIME_SECONDS` (default: 900, i.e. 15 minutes)
    /// - `SESSION_EXPIRE_SECONDS` (default: 86400, i.e. 24 hours)
    pub fn from_env() -> Self {
        Self {
            max_attempts: parse_env_or("MAX_LOGIN_ATTEMPTS", 5),
            lock_secs: parse_env_or("LOCK_TIME_SECONDS", 900),
            session_secs: parse_env_or("SESSION_EXPIRE_SECONDS", 86400),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lock_secs: 900,
            session_secs: 86400,
        }
    }
}

fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Session and lockout manager.
///
/// Owns the `attempts:{username}` and `session:{token}` key spaces in the
/// key-value store; reads and writes user rows only through the injected
/// [`UserRepository`].
#[derive(Clone)]
pub struct AuthManager {
    users: Arc<dyn UserRepository>,
    store: Arc<dyn KeyValueStore>,
    pepper: String,
    config: AuthConfig,
}

impl AuthManager {
    /// Create a new manager
    ///
    /// # Arguments
    ///
    /// * `users` - Credential store handle
    /// * `store` - Key-value store for counters and session records
    /// * `pepper` - Server-side pepper for password hashing
    /// * `config` - Lockout and session parameters
    pub fn new(
        users: Arc<dyn UserRepository>,
        store: Arc<dyn KeyValueStore>,
        pepper: String,
        config: AuthConfig,
    ) -> Self {
        Self {
            users,
            store,
            pepper,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Register a new user
    ///
    /// Validates input shape, hashes the password with Argon2id, and
    /// delegates the insert to the credential store.
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - Username, password, or email malformed
    /// * `AuthError::DuplicateUsername` - Username already exists
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<UserId> {
        let username = request.username.trim();
        validate_username(username)?;
        validate_password(&request.password)?;

        let email = request
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty());
        if let Some(email) = email {
            validate_email(email)?;
        }

        let password_hash = self.hash_password(&request.password)?;
        self.users.create_user(username, &password_hash, email).await
    }

    /// Login with username and password
    ///
    /// The lockout gate runs before any credential check, so a locked
    /// account rejects even a correct password and a well-timed probe
    /// cannot reset the failure counter.
    ///
    /// # Errors
    ///
    /// * `AuthError::AccountLocked` - Lockout active, with remaining seconds
    /// * `AuthError::InvalidCredentials` - Unknown username or wrong password
    /// * `AuthError::StoreUnavailable` - Backing store timeout or failure
    pub async fn login(&self, request: LoginRequest, client: ClientInfo) -> AuthResult<Session> {
        let username = request.username.trim();
        if username.is_empty() || request.password.is_empty() {
            return Err(AuthError::Validation(
                "Username and password must not be empty".to_string(),
            ));
        }

        if let Some(remaining) = self.lock_remaining(username).await? {
            return Err(AuthError::AccountLocked {
                remaining_secs: remaining.as_secs(),
            });
        }

        let Some(user) = self.users.find_by_username(username).await? else {
            // Unknown usernames count toward the lockout window too, so the
            // failure tally cannot be used to probe for existing accounts.
            self.record_failure(username).await?;
            self.audit(None, username, &client, LoginStatus::Failed, "unknown username")
                .await;
            return Err(AuthError::InvalidCredentials);
        };

        if self.verify_password(&request.password, &user.password_hash).is_err() {
            let failures = self.record_failure(username).await?;
            self.audit(
                Some(user.id),
                username,
                &client,
                LoginStatus::Failed,
                &format!("password mismatch, failure #{failures}"),
            )
            .await;
            return Err(AuthError::InvalidCredentials);
        }

        // Success: the failure tally resets and a fresh token is issued.
        self.store.delete(&attempts_key(username)).await?;
        let session = self.issue_session(user.id, &user.username).await?;
        self.audit(Some(user.id), username, &client, LoginStatus::Success, "login ok")
            .await;

        Ok(session)
    }

    /// Look up a session by token.
    ///
    /// Absent, expired, and revoked tokens all report `InvalidSession`.
    pub async fn verify(&self, token: &str) -> AuthResult<Session> {
        if token.is_empty() {
            return Err(AuthError::InvalidSession);
        }

        let key = session_key(token);
        let raw = self
            .store
            .get(&key)
            .await?
            .ok_or(AuthError::InvalidSession)?;
        let session: Session =
            serde_json::from_str(&raw).map_err(|_| AuthError::InvalidSession)?;

        // Stores without precise native TTLs still get lazy-expire
        // semantics from the timestamp carried in the record itself.
        if session.expires_at <= Utc::now() {
            let _ = self.store.delete(&key).await;
            return Err(AuthError::InvalidSession);
        }

        Ok(session)
    }

    /// Destroy a session. Idempotent: an absent or expired token is not an
    /// error.
    pub async fn logout(&self, token: &str) -> AuthResult<()> {
        self.store.delete(&session_key(token)).await?;
        Ok(())
    }

    /// Fetch the profile for the session's user.
    pub async fn fetch_profile(&self, token: &str) -> AuthResult<UserProfile> {
        let session = self.verify(token).await?;
        let user = self
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(user.profile())
    }

    /// Remaining lock time for a username, or `None` when not locked.
    ///
    /// Locked means the failure counter is alive and at or past the
    /// threshold; the remaining time is the counter's TTL.
    async fn lock_remaining(&self, username: &str) -> AuthResult<Option<Duration>> {
        let key = attempts_key(username);
        let count = match self.store.get(&key).await? {
            Some(raw) => raw.parse::<i64>().unwrap_or(0),
            None => return Ok(None),
        };

        if count < i64::from(self.config.max_attempts) {
            return Ok(None);
        }

        // The counter may expire between the reads; absent TTL means the
        // lock just lapsed.
        Ok(self.store.ttl(&key).await?)
    }

    /// Atomically bump the failure counter, arming the lock when the
    /// threshold is reached.
    async fn record_failure(&self, username: &str) -> AuthResult<i64> {
        let failures = self
            .store
            .incr_with_ttl(&attempts_key(username), self.lock_duration())
            .await?;

        if failures == i64::from(self.config.max_attempts) {
            log::warn!(
                "account locked after {failures} failed logins: {username} ({}s)",
                self.config.lock_secs
            );
        }

        Ok(failures)
    }

    async fn issue_session(&self, user_id: UserId, username: &str) -> AuthResult<Session> {
        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id,
            username: username.to_string(),
            created_at: now,
            expires_at: now + ChronoDuration::seconds(self.config.session_secs as i64),
        };

        let payload = serde_json::to_string(&session)?;
        self.store
            .set_with_ttl(
                &session_key(&session.token),
                &payload,
                Duration::from_secs(self.config.session_secs),
            )
            .await?;

        Ok(session)
    }

    /// Append to the audit trail; the sink never affects the login outcome.
    async fn audit(
        &self,
        user_id: Option<UserId>,
        username: &str,
        client: &ClientInfo,
        status: LoginStatus,
        message: &str,
    ) {
        let attempt = LoginAttemptLog {
            user_id,
            username: username.to_string(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            status,
            message: message.to_string(),
        };

        if let Err(err) = self.users.record_login_attempt(&attempt).await {
            log::warn!("login audit append failed: {err}");
        }
    }

    fn lock_duration(&self) -> Duration {
        Duration::from_secs(self.config.lock_secs)
    }

    /// Hash a password with Argon2id, salted and peppered
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let peppered = format!("{}{}", password, self.pepper);
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        Ok(argon2
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify a password against a stored hash
    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<()> {
        let peppered = format!("{}{}", password, self.pepper);
        let parsed_hash =
            PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
        let argon2 = Argon2::default();

        argon2
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}

/// Validate username format: 3-20 characters, alphanumeric and underscores
fn validate_username(username: &str) -> AuthResult<()> {
    let len = username.chars().count();
    if !(3..=20).contains(&len) {
        return Err(AuthError::Validation(
            "Username must be 3-20 characters".to_string(),
        ));
    }

    if !username.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(AuthError::Validation(
            "Username can only contain letters, numbers, and underscores".to_string(),
        ));
    }

    Ok(())
}

/// Validate password strength
fn validate_password(password: &str) -> AuthResult<()> {
    if password.len() < 8 {
        return Err(AuthError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());

    if !has_digit || !has_uppercase || !has_lowercase {
        return Err(AuthError::Validation(
            "Password must contain at least one number, one uppercase and one lowercase letter"
                .to_string(),
        ));
    }

    Ok(())
}

/// Minimal email shape check; full deliverability is out of scope
fn validate_email(email: &str) -> AuthResult<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(AuthError::Validation("Invalid email address".to_string()))
    }
}
