//! Integration tests for the authentication flow.
//!
//! Exercises the public API end to end over the in-process backends:
//! registration, lockout engagement and expiry, session lifecycle.

use std::sync::Arc;
use std::time::Duration;

use user_login::auth::{AuthConfig, AuthError, AuthManager, ClientInfo, LoginRequest, RegisterRequest};
use user_login::db::repository::memory::InMemoryUserRepository;
use user_login::kv::MemoryStore;

fn setup_auth_manager(config: AuthConfig) -> AuthManager {
    AuthManager::new(
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(MemoryStore::new()),
        "integration_test_pepper".to_string(),
        config,
    )
}

fn register_request(username: &str, password: &str, email: Option<&str>) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        password: password.to_string(),
        email: email.map(str::to_string),
    }
}

fn login_request(username: &str, password: &str) -> LoginRequest {
    LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    }
}

/// The scenario from the service contract: register alice, fail five times,
/// hit the lock with the correct password, wait out the lock, log in.
#[tokio::test(start_paused = true)]
async fn alice_lockout_scenario() {
    let config = AuthConfig {
        max_attempts: 5,
        lock_secs: 900,
        session_secs: 86400,
    };
    let auth = setup_auth_manager(config.clone());

    let user_id = auth
        .register(register_request("alice", "Secret123!", Some("a@x.com")))
        .await
        .expect("registration should succeed");
    assert!(user_id > 0);

    // Five wrong passwords: every one reports invalid credentials, the
    // fifth arms the lock.
    for attempt in 1..=5 {
        let err = auth
            .login(login_request("alice", "wrongWrong1"), ClientInfo::default())
            .await
            .unwrap_err();
        assert!(
            matches!(err, AuthError::InvalidCredentials),
            "attempt {attempt} should report invalid credentials"
        );
    }

    // Correct password immediately after: locked.
    let err = auth
        .login(login_request("alice", "Secret123!"), ClientInfo::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::AccountLocked { .. }));

    // After the lock duration the same credentials succeed.
    tokio::time::advance(Duration::from_secs(config.lock_secs + 1)).await;

    let session = auth
        .login(login_request("alice", "Secret123!"), ClientInfo::default())
        .await
        .expect("login should succeed after the lock lapses");
    assert_eq!(session.user_id, user_id);
    let expires_in = session.expires_in();
    assert!(expires_in > 0 && expires_in <= config.session_secs as i64);
}

#[tokio::test]
async fn two_sessions_for_one_user_are_independent() {
    let auth = setup_auth_manager(AuthConfig::default());
    auth.register(register_request("carol", "Secret123!", None))
        .await
        .unwrap();

    let first = auth
        .login(login_request("carol", "Secret123!"), ClientInfo::default())
        .await
        .unwrap();
    let second = auth
        .login(login_request("carol", "Secret123!"), ClientInfo::default())
        .await
        .unwrap();
    assert_ne!(first.token, second.token);

    // Revoking one leaves the other valid.
    auth.logout(&first.token).await.unwrap();
    assert!(auth.verify(&first.token).await.is_err());
    assert!(auth.verify(&second.token).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn session_lifecycle_over_short_ttl() {
    let auth = setup_auth_manager(AuthConfig {
        max_attempts: 5,
        lock_secs: 900,
        session_secs: 60,
    });
    auth.register(register_request("dave", "Secret123!", None))
        .await
        .unwrap();

    let session = auth
        .login(login_request("dave", "Secret123!"), ClientInfo::default())
        .await
        .unwrap();

    // Valid within the window.
    tokio::time::advance(Duration::from_secs(59)).await;
    let verified = auth.verify(&session.token).await.unwrap();
    assert_eq!(verified.username, "dave");

    // Invalid after it, indistinguishable from never issued.
    tokio::time::advance(Duration::from_secs(2)).await;
    let expired = auth.verify(&session.token).await.unwrap_err();
    let unknown = auth.verify("never-issued").await.unwrap_err();
    assert_eq!(expired.to_string(), unknown.to_string());
}

#[tokio::test]
async fn concurrent_failed_logins_do_not_under_count() {
    let auth = Arc::new(setup_auth_manager(AuthConfig {
        max_attempts: 10,
        lock_secs: 900,
        session_secs: 86400,
    }));
    auth.register(register_request("erin", "Secret123!", None))
        .await
        .unwrap();

    let mut handles = vec![];
    for _ in 0..10 {
        let auth = Arc::clone(&auth);
        handles.push(tokio::spawn(async move {
            auth.login(login_request("erin", "wrongWrong1"), ClientInfo::default())
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_err());
    }

    // Ten concurrent failures must land exactly on the threshold.
    let err = auth
        .login(login_request("erin", "Secret123!"), ClientInfo::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::AccountLocked { .. }));
}

#[tokio::test]
async fn registration_race_leaves_single_winner() {
    let auth = Arc::new(setup_auth_manager(AuthConfig::default()));

    let mut handles = vec![];
    for _ in 0..8 {
        let auth = Arc::clone(&auth);
        handles.push(tokio::spawn(async move {
            auth.register(register_request("frank", "Secret123!", None))
                .await
        }));
    }

    let mut successes = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AuthError::DuplicateUsername) => duplicates += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(duplicates, 7);
}
