//! Application setup and initialization
//!
//! All startup logic lives here instead of main.rs so integration tests can
//! build the same application in-process.

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;
pub mod telemetry;

use crate::state::{AppState, UploadLimits};
use anyhow::{Context, Result};
use maktaba_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    telemetry::init_telemetry();

    tracing::info!("Configuration loaded and validated successfully");

    // Setup database
    let pool = database::setup_database(&config).await?;

    // Setup storage
    let storage = storage::setup_storage(&config).await?;

    let limits = UploadLimits {
        max_book_size_bytes: config.max_book_size_bytes(),
        max_video_size_bytes: config.max_video_size_bytes(),
        video_allowed_content_types: config.video_allowed_content_types().to_vec(),
    };

    let state = Arc::new(AppState::new(pool, storage, limits));

    // Setup routes
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
