//! Upload lifecycle engine
//!
//! The only place transition rules live. [`decide`] is a pure function of the
//! record's current status and an incoming event: it either yields a
//! [`Transition`] for the store to apply conditionally, or explains why nothing
//! should change. Duplicate and out-of-order events land in the second branch,
//! which is never an error.
//!
//! ```text
//! PENDING ──object-stored──▶ UPLOADED ──started──▶ PROCESSING
//!    │                          │                      │
//!    └──────────── completed ───┴──────────────────────┴──▶ COMPLETED
//!    └──────────── failed ──────┴──────────────────────┴──▶ FAILED
//! ```

use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::models::{UploadRecord, UploadStatus};

/// Something that happened to an upload, as reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    ObjectStored,
    ObjectRemoved,
    ProcessingStarted,
    ProcessingCompleted { result_key: Option<String> },
    ProcessingFailed { reason: Option<String> },
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::ObjectStored => "object-stored",
            LifecycleEvent::ObjectRemoved => "object-removed",
            LifecycleEvent::ProcessingStarted => "processing-started",
            LifecycleEvent::ProcessingCompleted { .. } => "processing-completed",
            LifecycleEvent::ProcessingFailed { .. } => "processing-failed",
        }
    }
}

impl Display for LifecycleEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

/// An approved status change. The store applies it only if the record's status
/// still equals `from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: UploadStatus,
    pub to: UploadStatus,
    pub result_key: Option<String>,
    pub clear_upload_handle: bool,
}

impl Transition {
    /// Apply to an in-memory record. Callers must have checked `record.status == self.from`.
    pub fn apply_to(&self, record: &mut UploadRecord, now: DateTime<Utc>) {
        record.status = self.to;
        record.updated_at = now;
        if let Some(ref key) = self.result_key {
            record.result_key = Some(key.clone());
        }
        if self.clear_upload_handle {
            record.upload_handle = None;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The record is in a terminal status.
    Terminal(UploadStatus),
    /// The event carries no state change (object removal).
    Informational,
    /// The record already reflects the event.
    AlreadySatisfied,
    /// The event does not apply to the record's current status.
    NotApplicable,
}

impl Display for IgnoreReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            IgnoreReason::Terminal(status) => write!(f, "record is terminal ({})", status),
            IgnoreReason::Informational => write!(f, "informational event"),
            IgnoreReason::AlreadySatisfied => write!(f, "already satisfied"),
            IgnoreReason::NotApplicable => write!(f, "not applicable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Apply(Transition),
    Ignore(IgnoreReason),
}

impl Decision {
    pub fn is_apply(&self) -> bool {
        matches!(self, Decision::Apply(_))
    }
}

fn transition(from: UploadStatus, to: UploadStatus, result_key: Option<String>) -> Decision {
    Decision::Apply(Transition {
        from,
        to,
        result_key,
        clear_upload_handle: from == UploadStatus::Pending,
    })
}

/// Decide what `event` does to a record currently in `current`.
pub fn decide(current: UploadStatus, event: &LifecycleEvent) -> Decision {
    use UploadStatus::*;

    if current.is_terminal() {
        return Decision::Ignore(IgnoreReason::Terminal(current));
    }

    match (current, event) {
        (_, LifecycleEvent::ObjectRemoved) => Decision::Ignore(IgnoreReason::Informational),

        (Pending, LifecycleEvent::ObjectStored) => transition(Pending, Uploaded, None),
        (Uploaded | Processing, LifecycleEvent::ObjectStored) => {
            Decision::Ignore(IgnoreReason::AlreadySatisfied)
        }

        (Uploaded, LifecycleEvent::ProcessingStarted) => transition(Uploaded, Processing, None),
        (Processing, LifecycleEvent::ProcessingStarted) => {
            Decision::Ignore(IgnoreReason::AlreadySatisfied)
        }

        (Pending | Uploaded | Processing, LifecycleEvent::ProcessingCompleted { result_key }) => {
            transition(current, Completed, result_key.clone())
        }
        (Pending | Uploaded | Processing, LifecycleEvent::ProcessingFailed { .. }) => {
            transition(current, Failed, None)
        }

        _ => Decision::Ignore(IgnoreReason::NotApplicable),
    }
}
