//! Application state shared by every handler.

use crate::auth::IdentityVerifier;
use reelvault_core::Config;
use reelvault_db::UploadRecordStore;
use reelvault_services::{
    AccessGateway, CompletionListener, ConfirmationListener, EventPublisher, IntakeService,
    NotificationSender, Storage,
};
use std::sync::Arc;

/// Collaborators the services are built from. Swapped for fakes in tests.
pub struct Collaborators {
    pub store: Arc<dyn UploadRecordStore>,
    pub storage: Arc<dyn Storage>,
    pub notifier: Arc<dyn NotificationSender>,
    pub events: Arc<dyn EventPublisher>,
    pub verifier: Arc<dyn IdentityVerifier>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn UploadRecordStore>,
    pub storage: Arc<dyn Storage>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub intake: IntakeService,
    pub access: AccessGateway,
    pub confirmation: ConfirmationListener,
    pub completion: CompletionListener,
}

impl AppState {
    pub fn new(config: Config, collaborators: Collaborators) -> Self {
        let Collaborators {
            store,
            storage,
            notifier,
            events,
            verifier,
        } = collaborators;
        let concurrency = config.listener_concurrency();

        Self {
            intake: IntakeService::new(
                store.clone(),
                storage.clone(),
                config.record_retention_hours(),
            ),
            access: AccessGateway::new(store.clone(), storage.clone()),
            confirmation: ConfirmationListener::new(store.clone(), events, concurrency),
            completion: CompletionListener::new(store.clone(), notifier, concurrency),
            config,
            store,
            storage,
            verifier,
        }
    }
}
