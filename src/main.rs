use anyhow::Context;
use tracing_subscriber::EnvFilter;

use portal_api::api;
use portal_api::config::config;
use portal_api::database::manager::DatabaseManager;
use portal_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config();
    tracing::info!("Starting Portal API in {:?} mode", config.environment);
    if portal_api::is_production!() && config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set in production");
    }
    if portal_api::is_development!() {
        // Secrets are skipped by the Serialize impls
        tracing::debug!("configuration: {}", serde_json::to_string(config)?);
    }

    let database = DatabaseManager::connect(&config.database)
        .await
        .context("connecting to database")?;
    if config.database.run_migrations {
        database.migrate().await.context("running migrations")?;
    }

    let state = AppState::from_config(database.pool().clone(), config);
    let app = api::router(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Portal API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server")?;

    database.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
