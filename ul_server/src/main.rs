//! Authentication service HTTP server.
//!
//! Wires the PostgreSQL credential store and the in-process key-value
//! store into an [`AuthManager`] and serves the JSON API. Assumes the
//! relational schema already exists (see `migrations/` at the workspace
//! root); schema creation belongs to deployment, not to this process.

use std::sync::Arc;

use anyhow::Error;
use pico_args::Arguments;
use user_login::auth::AuthManager;
use user_login::db::{Database, PgUserRepository};
use user_login::kv::MemoryStore;

use ul_server::{api, config::ServerConfig, logging};

const HELP: &str = "\
Run the user_login authentication server

USAGE:
  ul_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/user_login_db]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g. 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  PASSWORD_PEPPER          Password hashing pepper (required, >= 16 chars)
  MAX_LOGIN_ATTEMPTS       Failures before lockout       [default: 5]
  LOCK_TIME_SECONDS        Lockout duration in seconds   [default: 900]
  SESSION_EXPIRE_SECONDS   Session lifetime in seconds   [default: 86400]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override = pargs.opt_value_from_str("--bind")?;
    let database_url_override = pargs.opt_value_from_str("--db-url")?;

    logging::init();

    let config = ServerConfig::from_env(bind_override, database_url_override)?;
    tracing::info!("Starting authentication server at {}", config.bind);

    tracing::info!("Connecting to database");
    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {e}"))?;
    db.health_check()
        .await
        .map_err(|e| anyhow::anyhow!("Database health check failed: {e}"))?;
    tracing::info!("Database connected successfully");

    let auth = Arc::new(AuthManager::new(
        Arc::new(PgUserRepository::new(db.pool().clone())),
        Arc::new(MemoryStore::new()),
        config.security.password_pepper.clone(),
        config.auth.clone(),
    ));

    let app = api::create_router(api::AppState { auth })
        .into_make_service_with_connect_info::<std::net::SocketAddr>();

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {e}", config.bind))?;

    tracing::info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {e}"))?;

    tracing::info!("Shutting down server");
    db.close().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
