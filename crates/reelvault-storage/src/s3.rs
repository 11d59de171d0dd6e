use crate::keys::{generate_source_key, validate_key};
use crate::policy::UploadPolicy;
use crate::traits::{ReadHandle, Storage, StorageError, StorageResult, WriteHandle};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::Utc;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, Result as ObjectResult};
use std::time::Duration;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    policy: UploadPolicy,
    upload_expiry: Duration,
    download_expiry: Duration,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        policy: UploadPolicy,
        upload_expiry_secs: u64,
        download_expiry_secs: u64,
    ) -> StorageResult<Self> {
        // Credentials come from the environment; bucket and region are explicit.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder.with_endpoint(endpoint).with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            policy,
            upload_expiry: Duration::from_secs(upload_expiry_secs),
            download_expiry: Duration::from_secs(download_expiry_secs),
        })
    }

    async fn sign(&self, method: Method, key: &str, expires_in: Duration) -> StorageResult<String> {
        let location = Path::from(key.to_string());
        let url_result: ObjectResult<_> =
            self.store.signed_url(method, &location, expires_in).await;

        let url = url_result.map_err(|e| {
            tracing::error!(error = %e, bucket = %self.bucket, key = %key, "S3 signing failed");
            StorageError::BackendError(e.to_string())
        })?;

        Ok(url.to_string())
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn issue_write_handle(
        &self,
        destination_hint: &str,
        content_type: &str,
        owner_id: &str,
        size_bytes: i64,
    ) -> StorageResult<WriteHandle> {
        self.policy.check(destination_hint, content_type, size_bytes)?;

        let object_key = generate_source_key(owner_id, destination_hint, Utc::now());
        let handle = self
            .sign(Method::PUT, &object_key, self.upload_expiry)
            .await?;

        tracing::info!(
            bucket = %self.bucket,
            key = %object_key,
            size_bytes = size_bytes,
            "Issued S3 upload URL"
        );

        Ok(WriteHandle {
            handle,
            object_key,
            expires_in_seconds: self.upload_expiry.as_secs(),
        })
    }

    async fn issue_read_handle(
        &self,
        object_key: &str,
        download_name: &str,
    ) -> StorageResult<ReadHandle> {
        validate_key(object_key)?;
        // The signer cannot bind response-content-disposition, so the name is not embedded.
        let handle = self
            .sign(Method::GET, object_key, self.download_expiry)
            .await?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %object_key,
            download_name = %download_name,
            "Issued S3 download URL"
        );

        Ok(ReadHandle {
            handle,
            expires_in_seconds: self.download_expiry.as_secs(),
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }

    async fn health_check(&self) -> StorageResult<()> {
        let location = Path::from("health-check-non-existent-key");
        match self.store.head(&location).await {
            Ok(_) | Err(ObjectStoreError::NotFound { .. }) => Ok(()),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }
}
