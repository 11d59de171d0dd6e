use chrono::{Duration, Utc};
use reelvault_core::models::{CreateUploadRequest, CreateUploadResponse, NewUploadRecord};
use reelvault_core::{AppError, RequestValidator, UploadRecord};
use reelvault_db::UploadRecordStore;
use reelvault_storage::Storage;
use std::sync::Arc;

/// Issues upload URLs and creates the PENDING record that tracks them.
#[derive(Clone)]
pub struct IntakeService {
    store: Arc<dyn UploadRecordStore>,
    storage: Arc<dyn Storage>,
    validator: RequestValidator,
    retention: Duration,
}

impl IntakeService {
    pub fn new(
        store: Arc<dyn UploadRecordStore>,
        storage: Arc<dyn Storage>,
        retention_hours: i64,
    ) -> Self {
        Self {
            store,
            storage,
            validator: RequestValidator::new(),
            retention: Duration::hours(retention_hours),
        }
    }

    /// Validate the request, obtain a write handle and persist the record.
    ///
    /// Nothing is persisted unless both the handle and the record are obtained.
    #[tracing::instrument(skip(self, request), fields(owner_id = %owner_id, file_name = %request.file_name))]
    pub async fn create_upload(
        &self,
        owner_id: &str,
        request: CreateUploadRequest,
    ) -> Result<CreateUploadResponse, AppError> {
        self.validator.validate_create(&request)?;

        let write = self
            .storage
            .issue_write_handle(
                &request.file_name,
                &request.file_type,
                owner_id,
                request.file_size_bytes,
            )
            .await?;

        let record = UploadRecord::pending(
            NewUploadRecord {
                owner_id: owner_id.to_string(),
                file_name: request.file_name,
                file_type: request.file_type,
                file_size_bytes: request.file_size_bytes,
                source_key: write.object_key.clone(),
                upload_handle: write.handle.clone(),
            },
            Utc::now(),
            self.retention,
        );
        self.store.create(&record).await?;

        tracing::info!(
            file_id = %record.file_id,
            source_key = %record.source_key,
            expires_in = write.expires_in_seconds,
            "Upload URL issued"
        );

        Ok(CreateUploadResponse {
            file_id: record.file_id,
            upload_url: write.handle,
            file_key: write.object_key,
            expires_in: write.expires_in_seconds,
            status: record.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::local_storage;
    use reelvault_core::UploadStatus;
    use reelvault_db::InMemoryUploadRecordStore;

    fn service(store: &InMemoryUploadRecordStore) -> IntakeService {
        IntakeService::new(Arc::new(store.clone()), Arc::new(local_storage()), 24)
    }

    fn request(file_name: &str, file_type: &str, size: i64) -> CreateUploadRequest {
        CreateUploadRequest {
            file_name: file_name.to_string(),
            file_type: file_type.to_string(),
            file_size_bytes: size,
        }
    }

    #[tokio::test]
    async fn creates_pending_record_with_handle() {
        let store = InMemoryUploadRecordStore::new();
        let response = service(&store)
            .create_upload("u1", request("clip.mp4", "video/mp4", 2048))
            .await
            .unwrap();

        assert_eq!(response.status, UploadStatus::Pending);
        assert_eq!(response.expires_in, 3600);
        assert!(response.file_key.starts_with("uploads/u1/"));

        let record = store.get_by_id(response.file_id).await.unwrap();
        assert_eq!(record.owner_id, "u1");
        assert_eq!(record.source_key, response.file_key);
        assert_eq!(record.upload_handle.as_deref(), Some(response.upload_url.as_str()));
        assert_eq!(record.expires_at - record.created_at, Duration::hours(24));
    }

    #[tokio::test]
    async fn policy_rejection_creates_nothing() {
        let store = InMemoryUploadRecordStore::new();
        let err = service(&store)
            .create_upload("u1", request("clip.mp4", "image/png", 2048))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PayloadRejected(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn invalid_requests_fail_validation() {
        let store = InMemoryUploadRecordStore::new();
        let err = service(&store)
            .create_upload("u1", request("../clip.mp4", "video/mp4", 0))
            .await
            .unwrap_err();

        let fields: Vec<&str> = err
            .field_errors()
            .unwrap()
            .iter()
            .map(|f| f.field.as_str())
            .collect();
        assert!(fields.contains(&"file_name"));
        assert!(fields.contains(&"file_size_bytes"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn each_intake_gets_its_own_record() {
        let store = InMemoryUploadRecordStore::new();
        let service = service(&store);
        let first = service
            .create_upload("u1", request("clip.mp4", "video/mp4", 10))
            .await
            .unwrap();
        let second = service
            .create_upload("u1", request("clip.mp4", "video/mp4", 10))
            .await
            .unwrap();

        assert_ne!(first.file_id, second.file_id);
        assert_ne!(first.file_key, second.file_key);
        assert_eq!(store.len(), 2);
    }
}
