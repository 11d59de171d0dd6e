#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult, UploadPolicy};
use reelvault_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let policy = UploadPolicy::from_config(config);

    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config
                .s3_region()
                .or_else(|| config.aws_region())
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
                })?;
            let endpoint = config.s3_endpoint().map(String::from);

            let storage = S3Storage::new(
                bucket,
                region,
                endpoint,
                policy,
                config.upload_url_expiry_secs(),
                config.download_url_expiry_secs(),
            )?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_url = config
                .local_storage_base_url()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
                })?;
            let signing_key = config.local_storage_signing_key().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_SIGNING_KEY not configured".to_string())
            })?;

            let storage = LocalStorage::new(
                base_url,
                signing_key,
                policy,
                config.upload_url_expiry_secs(),
                config.download_url_expiry_secs(),
            )?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelvault_core::ServiceConfig;

    #[test]
    fn local_backend_needs_base_url_and_key() {
        let config = Config(Box::new(ServiceConfig::default()));
        assert!(matches!(
            create_storage(&config),
            Err(StorageError::ConfigError(_))
        ));

        let config = Config(Box::new(ServiceConfig {
            local_storage_base_url: Some("http://localhost:4000/files".to_string()),
            local_storage_signing_key: Some("dev-key".to_string()),
            ..ServiceConfig::default()
        }));
        let storage = create_storage(&config).unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }

    #[test]
    fn s3_backend_needs_bucket() {
        let config = Config(Box::new(ServiceConfig {
            storage_backend: StorageBackend::S3,
            s3_region: Some("us-east-1".to_string()),
            ..ServiceConfig::default()
        }));
        assert!(matches!(
            create_storage(&config),
            Err(StorageError::ConfigError(ref m)) if m.contains("S3_BUCKET")
        ));
    }
}
