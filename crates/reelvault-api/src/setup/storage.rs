//! Storage setup and initialization

use anyhow::Result;
use reelvault_core::Config;
use reelvault_services::{create_storage, Storage};
use std::sync::Arc;

pub fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage backend...");
    let storage = create_storage(config)?;
    tracing::info!(
        backend = ?storage.backend_type(),
        max_upload_bytes = config.max_upload_size_bytes(),
        upload_url_expiry_secs = config.upload_url_expiry_secs(),
        "Storage backend initialized"
    );
    Ok(storage)
}
