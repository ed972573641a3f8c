use anyhow::Context;
use tracing_subscriber::EnvFilter;

use books_api::auth::TokenService;
use books_api::config::AppConfig;
use books_api::database::Database;
use books_api::server;
use books_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up BOOKS_DB_PATH, BOOKS_MAGIC_KEYS, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("books_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!("Starting Books API in {:?} mode", config.environment);

    if let Ok(pwd) = std::env::current_dir() {
        tracing::info!("Working directory: {}", pwd.display());
    }

    let tokens = TokenService::initialize(&config).context("failed to load magic keys")?;

    // Migrations finish before the listener is bound
    let database = Database::open(&config.database)
        .await
        .with_context(|| format!("failed to open {}", config.database.path.display()))?;

    let bind_addr = config.bind_addr()?;
    let state = AppState::new(config, tokens, database.clone());
    let app = server::app(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Books API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    database.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
