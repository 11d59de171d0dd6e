//! Reelvault Services Layer
//!
//! This crate hosts the upload lifecycle orchestration: intake, the two
//! notification listeners, owner-gated access and the background handle reaper,
//! together with the outbound collaborators they call (failure notifications and
//! upload events). Keep business logic and coordination here; keep thin HTTP
//! handling in reelvault-api.

pub mod access;
pub mod completion;
pub mod confirmation;
mod driver;
pub mod events;
pub mod intake;
pub mod notifications;
pub mod notifier;
pub mod reaper;

pub use access::AccessGateway;
pub use completion::CompletionListener;
pub use confirmation::ConfirmationListener;
pub use driver::{NotificationResult, MAX_EVALUATIONS};
pub use events::{EventPublisher, NoopEventPublisher, UploadEvent, WebhookEventPublisher};
pub use intake::IntakeService;
pub use notifications::{
    decode_processing_batch, decode_storage_event, DecodedBatch, NotificationDecodeError,
};
pub use notifier::{
    EmailNotificationSender, NoopNotificationSender, NotificationSender, NotifyError,
};
pub use reaper::UploadHandleReaper;
pub use reelvault_storage::{create_storage, Storage, StorageBackend, StorageError, StorageResult};

#[cfg(test)]
pub(crate) mod test_support;
