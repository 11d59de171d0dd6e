//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use reelvault_core::AppError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The upload violates the size, content-type or extension policy.
    #[error("{0}")]
    PayloadRejected(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::PayloadRejected(msg) => AppError::PayloadRejected(msg),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::BackendError(msg) | StorageError::ConfigError(msg) => {
                AppError::Storage(msg)
            }
        }
    }
}

/// A presigned write credential and the key the object will land at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteHandle {
    pub handle: String,
    pub object_key: String,
    pub expires_in_seconds: u64,
}

/// A presigned read credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadHandle {
    pub handle: String,
    pub expires_in_seconds: u64,
}

/// Storage abstraction trait
///
/// All storage backends (S3, local signed URLs) implement this trait. Services
/// only ever see handles; they never read or write object bytes.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Check the upload against the policy, allocate a source key and sign a PUT for it.
    ///
    /// `destination_hint` is the client's file name; it only shapes the key suffix.
    /// Fails with `PayloadRejected` when the upload violates the policy.
    async fn issue_write_handle(
        &self,
        destination_hint: &str,
        content_type: &str,
        owner_id: &str,
        size_bytes: i64,
    ) -> StorageResult<WriteHandle>;

    /// Sign a GET for an existing object.
    async fn issue_read_handle(
        &self,
        object_key: &str,
        download_name: &str,
    ) -> StorageResult<ReadHandle>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Cheap reachability probe used by the health endpoint.
    async fn health_check(&self) -> StorageResult<()>;
}
