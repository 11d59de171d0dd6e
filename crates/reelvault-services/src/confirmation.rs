use futures::stream::{self, StreamExt};
use percent_encoding::percent_decode_str;
use reelvault_core::models::{BatchSummary, ObjectEventKind, StorageNotification};
use reelvault_core::LifecycleEvent;
use reelvault_db::{StoreError, UploadRecordStore};
use std::sync::Arc;

use crate::driver::{drive_event, summarize, DriveOutcome, NotificationResult};
use crate::events::{EventPublisher, UploadEvent};

/// Object keys arrive form-encoded: `+` is a space, everything else percent-escaped.
pub fn normalize_object_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Drives PENDING→UPLOADED from object-store notifications.
#[derive(Clone)]
pub struct ConfirmationListener {
    store: Arc<dyn UploadRecordStore>,
    events: Arc<dyn EventPublisher>,
    concurrency: usize,
}

impl ConfirmationListener {
    pub fn new(
        store: Arc<dyn UploadRecordStore>,
        events: Arc<dyn EventPublisher>,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            events,
            concurrency: concurrency.max(1),
        }
    }

    /// Process a batch. Failures are isolated per notification and never fail the batch.
    #[tracing::instrument(skip(self, notifications), fields(batch_size = notifications.len()))]
    pub async fn handle_batch(&self, notifications: Vec<StorageNotification>) -> BatchSummary {
        let results: Vec<NotificationResult> = stream::iter(notifications)
            .map(|notification| self.handle_one(notification))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let summary = summarize(&results);
        tracing::info!(
            received = summary.received,
            applied = summary.applied,
            ignored = summary.ignored,
            skipped = summary.skipped,
            failed = summary.failed,
            "Storage notification batch processed"
        );
        summary
    }

    async fn handle_one(&self, notification: StorageNotification) -> NotificationResult {
        let object_key = normalize_object_key(&notification.object_key);

        if notification.kind == ObjectEventKind::Removed {
            tracing::info!(object_key = %object_key, "Object removed");
            return NotificationResult::Ignored;
        }

        let record = match self.store.get_by_source_key(&object_key).await {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => {
                tracing::warn!(object_key = %object_key, "No upload record for stored object");
                return NotificationResult::Skipped;
            }
            Err(e) => {
                tracing::error!(error = %e, object_key = %object_key, "Failed to look up upload record");
                return NotificationResult::Failed;
            }
        };
        let file_id = record.file_id;

        match drive_event(self.store.as_ref(), record, &LifecycleEvent::ObjectStored).await {
            Ok(DriveOutcome::Applied(updated)) => {
                tracing::info!(
                    file_id = %file_id,
                    object_key = %object_key,
                    status = %updated.status,
                    "Upload confirmed"
                );
                if let Err(e) = self.events.publish(&UploadEvent::file_uploaded(updated)).await {
                    tracing::warn!(error = %e, file_id = %file_id, "Failed to publish upload event");
                }
                NotificationResult::Applied
            }
            Ok(DriveOutcome::Ignored { status, reason }) => {
                tracing::info!(
                    file_id = %file_id,
                    status = %status,
                    reason = %reason,
                    "Object-stored notification ignored"
                );
                NotificationResult::Ignored
            }
            Err(StoreError::NotFound(_)) => {
                tracing::warn!(file_id = %file_id, "Upload record vanished during confirmation");
                NotificationResult::Skipped
            }
            Err(e) => {
                tracing::error!(error = %e, file_id = %file_id, "Failed to confirm upload");
                NotificationResult::Failed
            }
        }
    }
}
