use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status of an upload record.
///
/// `Completed`, `Failed` and `Expired` are terminal: once reached, no event moves
/// the record again.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "upload_status", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum UploadStatus {
    Pending,
    Uploaded,
    Processing,
    Completed,
    Failed,
    Expired,
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadStatus::Completed | UploadStatus::Failed | UploadStatus::Expired
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "PENDING",
            UploadStatus::Uploaded => "UPLOADED",
            UploadStatus::Processing => "PROCESSING",
            UploadStatus::Completed => "COMPLETED",
            UploadStatus::Failed => "FAILED",
            UploadStatus::Expired => "EXPIRED",
        }
    }
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UploadStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(UploadStatus::Pending),
            "UPLOADED" => Ok(UploadStatus::Uploaded),
            "PROCESSING" => Ok(UploadStatus::Processing),
            "COMPLETED" => Ok(UploadStatus::Completed),
            "FAILED" => Ok(UploadStatus::Failed),
            "EXPIRED" => Ok(UploadStatus::Expired),
            _ => Err(anyhow::anyhow!("Invalid upload status: {}", s)),
        }
    }
}

/// One tracked upload: descriptive metadata, storage locations and lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadRecord {
    pub file_id: Uuid,
    pub owner_id: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size_bytes: i64,
    pub source_key: String,
    pub result_key: Option<String>,
    pub status: UploadStatus,
    /// Presigned write URL; only meaningful while the record is `Pending`.
    pub upload_handle: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Inputs for a freshly issued upload, before it has an id or timestamps.
#[derive(Debug, Clone)]
pub struct NewUploadRecord {
    pub owner_id: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size_bytes: i64,
    pub source_key: String,
    pub upload_handle: String,
}

impl UploadRecord {
    /// Build a `Pending` record with a fresh v4 id and a retention horizon of
    /// `created_at + retention`.
    pub fn pending(new: NewUploadRecord, now: DateTime<Utc>, retention: Duration) -> Self {
        Self {
            file_id: Uuid::new_v4(),
            owner_id: new.owner_id,
            file_name: new.file_name,
            file_type: new.file_type,
            file_size_bytes: new.file_size_bytes,
            source_key: new.source_key,
            result_key: None,
            status: UploadStatus::Pending,
            upload_handle: Some(new.upload_handle),
            created_at: now,
            updated_at: now,
            expires_at: now + retention,
        }
    }

    pub fn is_owned_by(&self, subject_id: &str) -> bool {
        self.owner_id == subject_id
    }

    /// The write handle, hidden once the record has left `Pending`.
    pub fn visible_upload_handle(&self) -> Option<&str> {
        match self.status {
            UploadStatus::Pending => self.upload_handle.as_deref(),
            _ => None,
        }
    }
}
