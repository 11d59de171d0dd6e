//! Upload admission policy enforced before any write handle is signed.

use reelvault_core::Config;

use crate::traits::{StorageError, StorageResult};

#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_size_bytes: u64,
    /// Lowercase MIME types; empty allows any.
    pub allowed_content_types: Vec<String>,
    /// Lowercase extensions without the dot; empty allows any.
    pub allowed_extensions: Vec<String>,
}

impl UploadPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_size_bytes: config.max_upload_size_bytes(),
            allowed_content_types: config.allowed_content_types().to_vec(),
            allowed_extensions: config.allowed_extensions().to_vec(),
        }
    }

    pub fn check(&self, file_name: &str, content_type: &str, size_bytes: i64) -> StorageResult<()> {
        if size_bytes <= 0 {
            return Err(StorageError::PayloadRejected(
                "File size must be at least 1 byte".to_string(),
            ));
        }
        if size_bytes as u64 > self.max_size_bytes {
            return Err(StorageError::PayloadRejected(format!(
                "File size {} exceeds the maximum of {} bytes",
                size_bytes, self.max_size_bytes
            )));
        }

        let content_type = content_type.trim().to_lowercase();
        if !self.allowed_content_types.is_empty()
            && !self.allowed_content_types.contains(&content_type)
        {
            return Err(StorageError::PayloadRejected(format!(
                "Content type '{}' is not allowed. Allowed types: {}",
                content_type,
                self.allowed_content_types.join(", ")
            )));
        }

        if !self.allowed_extensions.is_empty() {
            let extension = file_name
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_lowercase())
                .unwrap_or_default();
            if !self.allowed_extensions.contains(&extension) {
                return Err(StorageError::PayloadRejected(format!(
                    "File extension '{}' is not allowed. Allowed extensions: {}",
                    extension,
                    self.allowed_extensions.join(", ")
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> UploadPolicy {
        UploadPolicy {
            max_size_bytes: 1024,
            allowed_content_types: vec!["video/mp4".to_string(), "video/quicktime".to_string()],
            allowed_extensions: vec!["mp4".to_string(), "mov".to_string()],
        }
    }

    #[test]
    fn accepts_allowed_video() {
        assert!(policy().check("clip.MP4", "Video/MP4", 1024).is_ok());
    }

    #[test]
    fn rejects_oversized_upload() {
        let err = policy().check("clip.mp4", "video/mp4", 1025).unwrap_err();
        assert!(matches!(err, StorageError::PayloadRejected(ref m) if m.contains("1024")));
    }

    #[test]
    fn rejects_unlisted_content_type() {
        let err = policy().check("clip.mp4", "image/png", 10).unwrap_err();
        assert!(matches!(err, StorageError::PayloadRejected(ref m) if m.contains("video/quicktime")));
    }

    #[test]
    fn rejects_unlisted_or_missing_extension() {
        assert!(policy().check("clip.exe", "video/mp4", 10).is_err());
        assert!(policy().check("clip", "video/mp4", 10).is_err());
    }

    #[test]
    fn empty_lists_allow_anything() {
        let open = UploadPolicy {
            max_size_bytes: 10,
            allowed_content_types: Vec::new(),
            allowed_extensions: Vec::new(),
        };
        assert!(open.check("notes", "text/plain", 10).is_ok());
    }
}
