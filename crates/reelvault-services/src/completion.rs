use futures::stream::{self, StreamExt};
use reelvault_core::models::{BatchSummary, ProcessingNotification, ProcessingOutcome};
use reelvault_core::{LifecycleEvent, UploadStatus};
use reelvault_db::{StoreError, UploadRecordStore};
use std::sync::Arc;
use uuid::Uuid;

use crate::driver::{drive_event, summarize, DriveOutcome, NotificationResult};
use crate::notifier::NotificationSender;

/// Drives records to PROCESSING, COMPLETED or FAILED from processing-pipeline outcomes.
#[derive(Clone)]
pub struct CompletionListener {
    store: Arc<dyn UploadRecordStore>,
    notifier: Arc<dyn NotificationSender>,
    concurrency: usize,
}

fn lifecycle_event(notification: &ProcessingNotification) -> LifecycleEvent {
    match notification.outcome {
        ProcessingOutcome::Started => LifecycleEvent::ProcessingStarted,
        ProcessingOutcome::Completed => LifecycleEvent::ProcessingCompleted {
            result_key: notification.result_key.clone(),
        },
        ProcessingOutcome::Failed => LifecycleEvent::ProcessingFailed {
            reason: notification.failure_reason.clone(),
        },
    }
}

impl CompletionListener {
    pub fn new(
        store: Arc<dyn UploadRecordStore>,
        notifier: Arc<dyn NotificationSender>,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            notifier,
            concurrency: concurrency.max(1),
        }
    }

    /// Process a batch. Failures are isolated per notification and never fail the batch.
    #[tracing::instrument(skip(self, notifications), fields(batch_size = notifications.len()))]
    pub async fn handle_batch(&self, notifications: Vec<ProcessingNotification>) -> BatchSummary {
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
            "Processing notification batch processed"
        );
        summary
    }

    async fn handle_one(&self, notification: ProcessingNotification) -> NotificationResult {
        let Some(raw_id) = notification.file_id.as_deref() else {
            tracing::warn!(outcome = ?notification.outcome, "Processing notification without fileId");
            return NotificationResult::Skipped;
        };
        let Ok(file_id) = Uuid::parse_str(raw_id) else {
            tracing::warn!(file_id = %raw_id, "Processing notification with malformed fileId");
            return NotificationResult::Skipped;
        };

        let record = match self.store.get_by_id(file_id).await {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => {
                tracing::warn!(file_id = %file_id, "Record not found for processing notification");
                return NotificationResult::Skipped;
            }
            Err(e) => {
                tracing::error!(error = %e, file_id = %file_id, "Failed to load upload record");
                return NotificationResult::Failed;
            }
        };

        let event = lifecycle_event(&notification);
        let updated = match drive_event(self.store.as_ref(), record, &event).await {
            Ok(DriveOutcome::Applied(updated)) => updated,
            Ok(DriveOutcome::Ignored { status, reason }) => {
                tracing::info!(
                    file_id = %file_id,
                    event = %event,
                    status = %status,
                    reason = %reason,
                    "Processing notification ignored"
                );
                return NotificationResult::Ignored;
            }
            Err(StoreError::NotFound(_)) => {
                tracing::warn!(file_id = %file_id, "Upload record vanished during processing update");
                return NotificationResult::Skipped;
            }
            Err(e) => {
                tracing::error!(error = %e, file_id = %file_id, event = %event, "Failed to apply processing outcome");
                return NotificationResult::Failed;
            }
        };

        tracing::info!(
            file_id = %file_id,
            status = %updated.status,
            result_key = ?updated.result_key,
            "Processing outcome applied"
        );

        if updated.status == UploadStatus::Failed {
            tracing::warn!(
                file_id = %file_id,
                reason = ?notification.failure_reason,
                "Video processing failed"
            );
            let address = notification
                .notify_address
                .as_deref()
                .unwrap_or(updated.owner_id.as_str());
            if let Err(e) = self.notifier.notify_failure(address, &updated.file_name).await {
                tracing::warn!(error = %e, file_id = %file_id, "Failed to send failure notification");
            }
        }

        NotificationResult::Applied
    }
}
