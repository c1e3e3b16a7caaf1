//! Application setup and initialization

pub mod health;
pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let pool = tubely_db::setup_database(&config).await?;

    let storage = tubely_storage::create_storage(&config).context("Failed to initialize storage")?;

    let state = services::initialize_services(&config, pool, storage);

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
