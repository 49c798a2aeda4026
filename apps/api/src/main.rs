mod ai_gateway;
mod config;
mod cv;
mod db;
mod errors;
mod interview;
mod models;
mod repository;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::ai_gateway::HttpAiGateway;
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::interview::expiration::ExpirationSweeper;
use crate::repository::PgRepository;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;
    let repo = Arc::new(PgRepository::new(db));

    // Initialize AI gateway client
    let ai = Arc::new(HttpAiGateway::new(
        &config.ai_gateway_url,
        config.ai_gateway_timeout(),
    )?);
    info!(
        "AI gateway client initialized ({}, timeout {}s)",
        config.ai_gateway_url, config.ai_gateway_timeout_secs
    );

    // Start the expiration sweeper
    let sweeper = Arc::new(ExpirationSweeper::new(
        repo.clone(),
        config.expiration_check_interval(),
        config.interview_duration(),
    ));
    let sweeper_handle = sweeper.clone().start();

    let state = AppState {
        repo,
        ai,
        config: config.clone(),
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            // TODO: restrict allowed origins once the web client's domain is fixed
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.stop();
    sweeper_handle.abort();
    info!("Shut down cleanly");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
