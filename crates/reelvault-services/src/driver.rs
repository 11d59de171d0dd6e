//! Applies one lifecycle event to one record through the store's conditional write.

use reelvault_core::models::BatchSummary;
use reelvault_core::{decide, Decision, IgnoreReason, LifecycleEvent, UploadRecord, UploadStatus};
use reelvault_db::{StoreError, StoreResult, UploadRecordStore};

/// Decisions made for one event before giving up on a record that keeps moving.
pub const MAX_EVALUATIONS: usize = 3;

#[derive(Debug)]
pub(crate) enum DriveOutcome {
    Applied(UploadRecord),
    Ignored {
        status: UploadStatus,
        reason: IgnoreReason,
    },
}

/// Decide `event` against `record` and persist the transition.
///
/// A lost conditional write re-reads the record and decides again against its
/// fresh status; I/O errors are returned as-is.
pub(crate) async fn drive_event(
    store: &dyn UploadRecordStore,
    mut record: UploadRecord,
    event: &LifecycleEvent,
) -> StoreResult<DriveOutcome> {
    let mut evaluations = 0;
    loop {
        evaluations += 1;
        let transition = match decide(record.status, event) {
            Decision::Apply(transition) => transition,
            Decision::Ignore(reason) => {
                return Ok(DriveOutcome::Ignored {
                    status: record.status,
                    reason,
                })
            }
        };

        match store.apply_transition(record.file_id, &transition).await {
            Ok(updated) => return Ok(DriveOutcome::Applied(updated)),
            Err(StoreError::StatusChanged { current }) if evaluations < MAX_EVALUATIONS => {
                tracing::debug!(
                    file_id = %record.file_id,
                    event = %event,
                    decided_from = %transition.from,
                    current = %current,
                    "Lost conditional write, re-deciding"
                );
                record = store.get_by_id(record.file_id).await?;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Per-notification result inside a listener batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationResult {
    Applied,
    Ignored,
    Skipped,
    Failed,
}

pub(crate) fn summarize(results: &[NotificationResult]) -> BatchSummary {
    let mut summary = BatchSummary {
        received: results.len(),
        ..BatchSummary::default()
    };
    for result in results {
        match result {
            NotificationResult::Applied => summary.applied += 1,
            NotificationResult::Ignored => summary.ignored += 1,
            NotificationResult::Skipped => summary.skipped += 1,
            NotificationResult::Failed => summary.failed += 1,
        }
    }
    summary
}
