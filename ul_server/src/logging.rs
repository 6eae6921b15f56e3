//! Structured logging configuration.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` environment variable.
/// Credentials and session tokens are never attached as log fields.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a security event with structured data
///
/// # Arguments
///
/// * `event_type` - Type of security event (e.g. "failed_login")
/// * `username` - Username the event applies to
/// * `ip_address` - Optional client address
/// * `message` - Event message
pub fn log_security_event(
    event_type: &str,
    username: &str,
    ip_address: Option<&str>,
    message: &str,
) {
    tracing::warn!(
        event_type = event_type,
        username = username,
        ip_address = ip_address,
        "SECURITY: {}",
        message
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_event_does_not_panic() {
        log_security_event("failed_login", "alice", Some("127.0.0.1"), "wrong password");
        log_security_event("account_locked", "bob", None, "lockout armed");
    }
}
