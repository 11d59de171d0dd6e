use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reelvault_core::{Transition, UploadRecord, UploadStatus};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::store::{clamp_list_limit, StoreError, StoreResult, UploadRecordStore};

/// Process-local upload record store.
///
/// One mutex guards the whole map and is never held across an await, so each
/// operation is atomic with respect to every other.
#[derive(Clone, Default)]
pub struct InMemoryUploadRecordStore {
    records: Arc<Mutex<HashMap<Uuid, UploadRecord>>>,
}

impl InMemoryUploadRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<Uuid, UploadRecord>> {
        // A panic mid-operation leaves the map consistent: every write is a single insert.
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

fn newest_first(records: &mut [UploadRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl UploadRecordStore for InMemoryUploadRecordStore {
    async fn create(&self, record: &UploadRecord) -> StoreResult<()> {
        let mut records = self.records();
        if records.contains_key(&record.file_id) {
            return Err(StoreError::DuplicateKey(format!(
                "file {} already exists",
                record.file_id
            )));
        }
        let source_taken = records
            .values()
            .any(|r| r.source_key == record.source_key && r.status != UploadStatus::Expired);
        if source_taken {
            return Err(StoreError::DuplicateKey(format!(
                "source key {} already exists",
                record.source_key
            )));
        }
        records.insert(record.file_id, record.clone());
        Ok(())
    }

    async fn get_by_id(&self, file_id: Uuid) -> StoreResult<UploadRecord> {
        self.records()
            .get(&file_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(file_id.to_string()))
    }

    async fn get_by_source_key(&self, source_key: &str) -> StoreResult<UploadRecord> {
        self.records()
            .values()
            .filter(|r| r.source_key == source_key)
            .max_by_key(|r| r.created_at)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(source_key.to_string()))
    }

    async fn apply_transition(
        &self,
        file_id: Uuid,
        transition: &Transition,
    ) -> StoreResult<UploadRecord> {
        let mut records = self.records();
        let record = records
            .get_mut(&file_id)
            .ok_or_else(|| StoreError::NotFound(file_id.to_string()))?;
        if record.status != transition.from {
            return Err(StoreError::StatusChanged {
                current: record.status,
            });
        }
        transition.apply_to(record, Utc::now());
        Ok(record.clone())
    }

    async fn list_by_owner(&self, owner_id: &str, limit: i64) -> StoreResult<Vec<UploadRecord>> {
        let mut owned: Vec<UploadRecord> = self
            .records()
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        newest_first(&mut owned);
        owned.truncate(clamp_list_limit(Some(limit)) as usize);
        Ok(owned)
    }

    async fn clear_upload_handle(&self, file_id: Uuid) -> StoreResult<bool> {
        let mut records = self.records();
        match records.get_mut(&file_id) {
            Some(record)
                if record.status == UploadStatus::Pending && record.upload_handle.is_some() =>
            {
                record.upload_handle = None;
                record.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_stale_handles(
        &self,
        issued_before: DateTime<Utc>,
        limit: i64,
    ) -> StoreResult<Vec<UploadRecord>> {
        let mut stale: Vec<UploadRecord> = self
            .records()
            .values()
            .filter(|r| {
                r.status == UploadStatus::Pending
                    && r.upload_handle.is_some()
                    && r.created_at < issued_before
            })
            .cloned()
            .collect();
        stale.sort_by_key(|r| r.created_at);
        stale.truncate(limit.max(1) as usize);
        Ok(stale)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
