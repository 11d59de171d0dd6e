use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reelvault_core::{AppError, Transition, UploadRecord, UploadStatus};
use uuid::Uuid;

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 100;

/// Clamp a requested page size to `1..=MAX_LIST_LIMIT`, defaulting when absent.
pub fn clamp_list_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

/// Record store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Upload record already exists: {0}")]
    DuplicateKey(String),

    #[error("Upload record not found: {0}")]
    NotFound(String),

    /// A conditional transition lost to another writer.
    #[error("Upload status changed concurrently (now {current})")]
    StatusChanged { current: UploadStatus },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey(msg) => AppError::DuplicateKey(msg),
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::StatusChanged { current } => AppError::InvalidState { status: current },
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

/// Keyed, conditionally-writable store with one record per upload.
#[async_trait]
pub trait UploadRecordStore: Send + Sync {
    /// Insert a new record. Fails with `DuplicateKey` if the file id, or the source
    /// key of a live record, is already taken; never overwrites.
    async fn create(&self, record: &UploadRecord) -> StoreResult<()>;

    async fn get_by_id(&self, file_id: Uuid) -> StoreResult<UploadRecord>;

    /// Most recently created record with this source key.
    async fn get_by_source_key(&self, source_key: &str) -> StoreResult<UploadRecord>;

    /// Apply `transition` only if the record is still in `transition.from`.
    ///
    /// Returns the updated record, `NotFound` if it vanished, or `StatusChanged`
    /// with the status another writer left it in.
    async fn apply_transition(
        &self,
        file_id: Uuid,
        transition: &Transition,
    ) -> StoreResult<UploadRecord>;

    /// Newest first; `limit` is clamped to `1..=MAX_LIST_LIMIT`.
    async fn list_by_owner(&self, owner_id: &str, limit: i64) -> StoreResult<Vec<UploadRecord>>;

    /// Drop the write handle of a record whose handle expired unconsumed.
    ///
    /// Only lands while the record is still `Pending` and holds a handle. Returns
    /// `false` without writing anything when the record has moved on or is gone.
    async fn clear_upload_handle(&self, file_id: Uuid) -> StoreResult<bool>;

    /// `Pending` records still holding a handle issued before `issued_before`, oldest first.
    async fn list_stale_handles(
        &self,
        issued_before: DateTime<Utc>,
        limit: i64,
    ) -> StoreResult<Vec<UploadRecord>>;

    async fn health_check(&self) -> StoreResult<()>;
}
