//! Collaborator construction and application state setup

use crate::auth::JwtIdentityVerifier;
use crate::state::{AppState, Collaborators};
use anyhow::{Context, Result};
use reelvault_core::Config;
use reelvault_db::UploadRecordStore;
use reelvault_services::{
    EmailNotificationSender, EventPublisher, NoopEventPublisher, NoopNotificationSender,
    NotificationSender, Storage, UploadHandleReaper, WebhookEventPublisher,
};
use std::sync::Arc;

/// Build every collaborator, the application state, and start background tasks.
pub fn initialize_services(
    config: &Config,
    store: Arc<dyn UploadRecordStore>,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let notifier = setup_notifier(config);
    let events = setup_event_publisher(config)?;

    let state = Arc::new(AppState::new(
        config.clone(),
        Collaborators {
            store: store.clone(),
            storage,
            notifier,
            events,
            verifier: Arc::new(JwtIdentityVerifier::from_config(config)),
        },
    ));

    start_handle_reaper(config, store);

    Ok(state)
}

fn setup_notifier(config: &Config) -> Arc<dyn NotificationSender> {
    if !config.email_alerts_enabled() {
        tracing::info!("Email alerts disabled; failure notifications are dropped");
        return Arc::new(NoopNotificationSender);
    }

    match EmailNotificationSender::from_config(config) {
        Some(sender) => {
            tracing::info!("Failure notifications will be sent by email");
            Arc::new(sender)
        }
        None => {
            tracing::warn!("Email alerts enabled but SMTP is not usable; failure notifications are dropped");
            Arc::new(NoopNotificationSender)
        }
    }
}

fn setup_event_publisher(config: &Config) -> Result<Arc<dyn EventPublisher>> {
    let publisher = WebhookEventPublisher::from_config(config)
        .context("Failed to initialize upload event webhook")?;

    Ok(match publisher {
        Some(publisher) => {
            tracing::info!("Upload events will be published to the configured webhook");
            Arc::new(publisher)
        }
        None => Arc::new(NoopEventPublisher),
    })
}

fn start_handle_reaper(config: &Config, store: Arc<dyn UploadRecordStore>) {
    let period = config.handle_reaper_interval_secs();
    if period == 0 {
        return;
    }

    let reaper = Arc::new(UploadHandleReaper::new(
        store,
        config.upload_url_expiry_secs(),
        period,
    ));
    reaper.start();
    tracing::info!(interval_secs = period, "Upload handle reaper started");
}
