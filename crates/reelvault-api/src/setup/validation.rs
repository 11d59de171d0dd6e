//! Configuration validation
//!
//! Runs the config's own checks, then warns about settings that are legal but
//! unusual for a deployment.

use anyhow::Result;
use reelvault_core::{Config, RecordStoreBackend};

pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.is_production() && config.record_store() == RecordStoreBackend::Memory {
        tracing::warn!("RECORD_STORE=memory in production - records will not survive a restart");
    }

    if config.notification_api_key().is_none() {
        tracing::warn!("NOTIFICATION_API_KEY not set - notification endpoints accept any caller");
    }

    if config.handle_reaper_interval_secs() == 0 {
        tracing::info!("Upload handle reaper disabled (HANDLE_REAPER_INTERVAL_SECS=0)");
    }

    Ok(())
}
