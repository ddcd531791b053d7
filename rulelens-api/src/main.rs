//! RuleLens - Main Application Entry Point
//!
//! Loads transactions, feature vectors and rules once at startup and
//! serves their evaluation over HTTP.

use anyhow::Context;
use rulelens_api::{AppState, ServerConfig};
use rulelens_storage::DatasetSource;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,rulelens_api=debug,rulelens_storage=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    tracing::info!("Starting RuleLens server on {}", config.bind_address());

    let source = config.dataset_source();

    // Evaluation never starts on partial data: a failed load stops startup
    let app_state = AppState::from_source(&source)
        .await
        .with_context(|| format!("Failed to load datasets from {}", source.describe()))?;

    // Build our application with routes
    let app = rulelens_api::create_router(Arc::new(app_state));

    // Run it
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
