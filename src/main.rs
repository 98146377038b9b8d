use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use agri_advisor::config::Config;
use agri_advisor::redis::RedisManager;
use agri_advisor::{build_handlers, service};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Arc::new(Config::load());

    let redis_manager = Arc::new(RedisManager::new_with_config(&config).await?);
    let handlers = Arc::new(build_handlers(&config, redis_manager)?);

    let bind: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid ADVISOR_HTTP_BIND '{}': {e}", config.server.bind))?;

    let router = service::router(handlers);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(
        %bind,
        name = %config.server.name,
        version = %config.server.version,
        model = %config.gemini.model,
        "Starting callable HTTP server"
    );

    axum::serve(listener, router).await?;
    tracing::info!("Server shutting down");
    Ok(())
}
