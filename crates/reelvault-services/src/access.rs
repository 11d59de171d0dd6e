use reelvault_core::models::DownloadResponse;
use reelvault_core::{AppError, UploadRecord, UploadStatus};
use reelvault_db::{clamp_list_limit, UploadRecordStore};
use reelvault_storage::Storage;
use std::sync::Arc;
use uuid::Uuid;

/// Owner-gated reads of upload records and their processed output.
#[derive(Clone)]
pub struct AccessGateway {
    store: Arc<dyn UploadRecordStore>,
    storage: Arc<dyn Storage>,
}

impl AccessGateway {
    pub fn new(store: Arc<dyn UploadRecordStore>, storage: Arc<dyn Storage>) -> Self {
        Self { store, storage }
    }

    async fn owned_record(
        &self,
        file_id: Uuid,
        requester_id: &str,
    ) -> Result<UploadRecord, AppError> {
        let record = self.store.get_by_id(file_id).await?;
        if !record.is_owned_by(requester_id) {
            tracing::warn!(
                file_id = %file_id,
                requester_id = %requester_id,
                "Access to another owner's upload denied"
            );
            return Err(AppError::Forbidden("You do not have access to this file".to_string()));
        }
        Ok(record)
    }

    #[tracing::instrument(skip(self))]
    pub async fn read(&self, file_id: Uuid, requester_id: &str) -> Result<UploadRecord, AppError> {
        self.owned_record(file_id, requester_id).await
    }

    /// Issue a read handle for the processed output of a COMPLETED upload.
    #[tracing::instrument(skip(self))]
    pub async fn get_download(
        &self,
        file_id: Uuid,
        requester_id: &str,
    ) -> Result<DownloadResponse, AppError> {
        let record = self.owned_record(file_id, requester_id).await?;

        let result_key = match (record.status, record.result_key.as_deref()) {
            (UploadStatus::Completed, Some(key)) => key,
            (status, _) => return Err(AppError::InvalidState { status }),
        };

        let read = self
            .storage
            .issue_read_handle(result_key, &record.file_name)
            .await?;

        tracing::info!(file_id = %file_id, "Download URL issued");

        Ok(DownloadResponse {
            download_url: read.handle,
            file_name: record.file_name,
            expires_in: read.expires_in_seconds,
        })
    }

    /// The requester's uploads, newest first. Returns the records and the effective limit.
    #[tracing::instrument(skip(self))]
    pub async fn list_owned(
        &self,
        requester_id: &str,
        limit: Option<i64>,
    ) -> Result<(Vec<UploadRecord>, i64), AppError> {
        let limit = clamp_list_limit(limit);
        let records = self.store.list_by_owner(requester_id, limit).await?;
        Ok((records, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{local_storage, pending_record};
    use reelvault_core::ErrorMetadata;
    use reelvault_db::InMemoryUploadRecordStore;

    async fn gateway_with(status: UploadStatus, result_key: Option<&str>) -> (AccessGateway, Uuid) {
        let store = InMemoryUploadRecordStore::new();
        let mut record = pending_record("u1", "uploads/u1/a.mp4");
        record.status = status;
        record.result_key = result_key.map(String::from);
        store.create(&record).await.unwrap();
        (
            AccessGateway::new(Arc::new(store), Arc::new(local_storage())),
            record.file_id,
        )
    }

    #[tokio::test]
    async fn owner_downloads_completed_output() {
        let (gateway, file_id) = gateway_with(UploadStatus::Completed, Some("out/clip.zip")).await;
        let download = gateway.get_download(file_id, "u1").await.unwrap();
        assert_eq!(download.file_name, "clip.mp4");
        assert_eq!(download.expires_in, 3600);
        assert!(download
            .download_url
            .starts_with("http://localhost:4000/files/out/clip.zip?method=GET"));
    }

    #[tokio::test]
    async fn non_owner_is_forbidden_regardless_of_status() {
        for status in [UploadStatus::Pending, UploadStatus::Completed, UploadStatus::Failed] {
            let (gateway, file_id) = gateway_with(status, Some("out/clip.zip")).await;
            let err = gateway.get_download(file_id, "u2").await.unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)), "status {}", status);
            assert!(matches!(
                gateway.read(file_id, "u2").await,
                Err(AppError::Forbidden(_))
            ));
        }
    }

    #[tokio::test]
    async fn unfinished_uploads_are_not_downloadable() {
        let (gateway, file_id) = gateway_with(UploadStatus::Processing, None).await;
        let err = gateway.get_download(file_id, "u1").await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATE");
        assert!(err.client_message().contains("PROCESSING"));
    }

    #[tokio::test]
    async fn completed_without_result_key_is_invalid_state() {
        let (gateway, file_id) = gateway_with(UploadStatus::Completed, None).await;
        assert!(matches!(
            gateway.get_download(file_id, "u1").await,
            Err(AppError::InvalidState {
                status: UploadStatus::Completed
            })
        ));
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let (gateway, _) = gateway_with(UploadStatus::Completed, None).await;
        assert!(matches!(
            gateway.get_download(Uuid::new_v4(), "u1").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_owned_reports_effective_limit() {
        let (gateway, file_id) = gateway_with(UploadStatus::Pending, None).await;
        let (records, limit) = gateway.list_owned("u1", Some(500)).await.unwrap();
        assert_eq!(limit, 100);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_id, file_id);
        assert!(gateway.list_owned("u2", None).await.unwrap().0.is_empty());
    }
}
