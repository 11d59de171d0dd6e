use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind of object-store event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ObjectEventKind {
    Created,
    Removed,
}

/// One object-store notification, key still in its raw (form-encoded) shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageNotification {
    pub kind: ObjectEventKind,
    pub object_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingOutcome {
    Started,
    Completed,
    Failed,
}

/// One processing-pipeline notification.
///
/// `file_id` stays a raw string so a malformed id is reported per record instead
/// of failing the whole batch at decode time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingNotification {
    pub file_id: Option<String>,
    pub outcome: ProcessingOutcome,
    pub result_key: Option<String>,
    pub failure_reason: Option<String>,
    pub notify_address: Option<String>,
}

/// Per-batch tally returned by the notification listeners
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchSummary {
    /// Notifications in the batch
    pub received: usize,
    /// Notifications that moved a record to a new status
    pub applied: usize,
    /// Notifications that were valid but changed nothing
    pub ignored: usize,
    /// Notifications dropped because they were malformed or matched no record
    pub skipped: usize,
    /// Notifications whose processing hit an error
    pub failed: usize,
}

impl BatchSummary {
    /// Account for records that were dropped before reaching a listener.
    pub fn with_rejected(mut self, rejected: usize) -> Self {
        self.received += rejected;
        self.skipped += rejected;
        self
    }
}
