//! Storage setup

use anyhow::{Context, Result};
use maktaba_core::Config;
use maktaba_storage::{LocalStorage, Storage};
use std::sync::Arc;

/// Create the storage backend for uploaded library files.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = LocalStorage::new(config.upload_dir())
        .await
        .context("Failed to initialize local storage")?;
    tracing::info!(upload_dir = %config.upload_dir(), "Local storage initialized");
    Ok(Arc::new(storage))
}
