use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::upload::{UploadRecord, UploadStatus};

/// Request to issue an upload URL for a new media file
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateUploadRequest {
    /// Original filename
    #[validate(length(
        min = 1,
        max = 255,
        message = "File name must be between 1 and 255 characters"
    ))]
    pub file_name: String,
    /// Content type (MIME type)
    #[validate(length(
        min = 1,
        max = 255,
        message = "File type must be between 1 and 255 characters"
    ))]
    pub file_type: String,
    /// File size in bytes
    #[validate(range(min = 1, message = "File size must be at least 1 byte"))]
    pub file_size_bytes: i64,
}

/// Response containing the presigned upload URL
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUploadResponse {
    pub file_id: Uuid,
    /// Presigned URL the client uploads the file to with HTTP PUT
    pub upload_url: String,
    /// Storage key the file will land at
    pub file_key: String,
    /// Seconds until `upload_url` stops working
    pub expires_in: u64,
    pub status: UploadStatus,
}

/// Client-facing view of an upload record
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadRecordResponse {
    pub file_id: Uuid,
    pub owner_id: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size_bytes: i64,
    pub source_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_key: Option<String>,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<UploadRecord> for UploadRecordResponse {
    fn from(record: UploadRecord) -> Self {
        let upload_url = record.visible_upload_handle().map(String::from);
        Self {
            file_id: record.file_id,
            owner_id: record.owner_id,
            file_name: record.file_name,
            file_type: record.file_type,
            file_size_bytes: record.file_size_bytes,
            source_key: record.source_key,
            result_key: record.result_key,
            status: record.status,
            upload_url,
            created_at: record.created_at,
            updated_at: record.updated_at,
            expires_at: record.expires_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ListUploadsQuery {
    /// Page size, clamped to 1..=100 (default 50)
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadListResponse {
    pub records: Vec<UploadRecordResponse>,
    pub count: usize,
    pub limit: i64,
}

/// Time-boxed download URL for a processed file
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadResponse {
    pub download_url: String,
    pub file_name: String,
    pub expires_in: u64,
}
