use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reelvault_core::models::NewUploadRecord;
use reelvault_core::{Transition, UploadRecord};
use reelvault_db::{StoreError, StoreResult, UploadRecordStore};
use reelvault_storage::{LocalStorage, UploadPolicy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::events::{EventPublisher, UploadEvent};
use crate::notifier::{NotificationSender, NotifyError};

pub fn pending_record(owner: &str, key: &str) -> UploadRecord {
    UploadRecord::pending(
        NewUploadRecord {
            owner_id: owner.to_string(),
            file_name: "clip.mp4".to_string(),
            file_type: "video/mp4".to_string(),
            file_size_bytes: 2048,
            source_key: key.to_string(),
            upload_handle: "http://localhost:4000/files/put".to_string(),
        },
        Utc::now(),
        Duration::hours(24),
    )
}

pub fn local_storage() -> LocalStorage {
    LocalStorage::new(
        "http://localhost:4000/files".to_string(),
        "test-signing-key",
        UploadPolicy {
            max_size_bytes: 10 * 1024 * 1024,
            allowed_content_types: vec!["video/mp4".to_string()],
            allowed_extensions: vec!["mp4".to_string()],
        },
        3600,
        3600,
    )
    .unwrap()
}

/// A store whose record always moves under the caller: every conditional write loses.
pub struct ContendedStore {
    record: UploadRecord,
    attempts: AtomicUsize,
}

impl ContendedStore {
    pub fn new(record: UploadRecord) -> Self {
        Self {
            record,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UploadRecordStore for ContendedStore {
    async fn create(&self, _record: &UploadRecord) -> StoreResult<()> {
        Ok(())
    }

    async fn get_by_id(&self, _file_id: Uuid) -> StoreResult<UploadRecord> {
        Ok(self.record.clone())
    }

    async fn get_by_source_key(&self, _source_key: &str) -> StoreResult<UploadRecord> {
        Ok(self.record.clone())
    }

    async fn apply_transition(
        &self,
        _file_id: Uuid,
        transition: &Transition,
    ) -> StoreResult<UploadRecord> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::StatusChanged {
            current: transition.from,
        })
    }

    async fn list_by_owner(&self, _owner_id: &str, _limit: i64) -> StoreResult<Vec<UploadRecord>> {
        Ok(vec![self.record.clone()])
    }

    async fn clear_upload_handle(&self, _file_id: Uuid) -> StoreResult<bool> {
        Ok(false)
    }

    async fn list_stale_handles(
        &self,
        _issued_before: DateTime<Utc>,
        _limit: i64,
    ) -> StoreResult<Vec<UploadRecord>> {
        Ok(Vec::new())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn notify_failure(&self, address: &str, file_name: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((address.to_string(), file_name.to_string()));
        if self.fail {
            return Err(NotifyError::Delivery("smtp unavailable".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    pub fail: bool,
    published: Mutex<Vec<(String, Uuid)>>,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<(String, Uuid)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &UploadEvent) -> Result<()> {
        self.published
            .lock()
            .unwrap()
            .push((event.event_type.to_string(), event.payload.file_id));
        if self.fail {
            anyhow::bail!("webhook unavailable");
        }
        Ok(())
    }
}
