//! snipbin: a small multi-user web application for sharing text
//! snippets. Visitors browse snippets; registered users create them,
//! signing up and logging in with durable, session-backed authentication.

mod config;
mod db;
mod error;
mod forms;
mod handlers;
mod middleware;
mod routes;
mod session;
mod state;
mod templates;
mod validation;

use tower_sessions::{cookie::SameSite, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,snipbin=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(?config, "configuration loaded");

    // Pool, schema migrations and the startup-built template cache. Any
    // failure here aborts before the listener opens.
    let state = AppState::new(&config).await?;
    tracing::info!("application state initialized");

    // Sessions live in the same SQLite database as the application data,
    // so authentication state survives a restart or redeploy.
    let session_store = SqliteStore::new(state.db.clone());
    session_store.migrate().await?;

    // Reap expired session rows so the store does not grow without bound.
    let reaper_store = session_store.clone();
    tokio::spawn(async move {
        use tower_sessions::ExpiredDeletion;
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(600));
        loop {
            interval.tick().await;
            tracing::debug!("deleting expired sessions");
            if let Err(err) = reaper_store.delete_expired().await {
                tracing::error!(error = %err, "expired session cleanup failed");
            }
        }
    });

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(true)
        .with_same_site(SameSite::Lax);

    let app = routes::routes(state, config.static_dir.clone(), session_layer);

    let bind_addr = config.bind_address();
    tracing::info!(%bind_addr, "starting server");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
