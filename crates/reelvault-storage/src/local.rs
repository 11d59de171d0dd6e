//! Locally signed URLs for development and tests.
//!
//! Handles look like `{base_url}/{key}?method=PUT&expires=..&signature=..`, where the
//! signature is a hex HMAC-SHA256 over the method, key, expiry and download name.

use crate::keys::{generate_source_key, validate_key};
use crate::policy::UploadPolicy;
use crate::traits::{ReadHandle, Storage, StorageError, StorageResult, WriteHandle};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Characters escaped inside a key path; `/` stays a separator.
const PATH_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const QUERY_ESCAPE: &AsciiSet = &PATH_ESCAPE.add(b'/');

/// Local signed-URL storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_url: String,
    signing_key: Vec<u8>,
    policy: UploadPolicy,
    upload_expiry_secs: u64,
    download_expiry_secs: u64,
}

impl LocalStorage {
    pub fn new(
        base_url: String,
        signing_key: impl AsRef<[u8]>,
        policy: UploadPolicy,
        upload_expiry_secs: u64,
        download_expiry_secs: u64,
    ) -> StorageResult<Self> {
        if signing_key.as_ref().is_empty() {
            return Err(StorageError::ConfigError(
                "LOCAL_STORAGE_SIGNING_KEY must not be empty".to_string(),
            ));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            signing_key: signing_key.as_ref().to_vec(),
            policy,
            upload_expiry_secs,
            download_expiry_secs,
        })
    }

    fn mac(&self, method: &str, object_key: &str, expires: i64, download_name: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.signing_key).expect("HMAC accepts any key size");
        mac.update(method.as_bytes());
        mac.update(b"\n");
        mac.update(object_key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        mac.update(b"\n");
        mac.update(download_name.as_bytes());
        mac
    }

    fn signed_url(
        &self,
        method: &str,
        object_key: &str,
        expires_in_secs: u64,
        download_name: Option<&str>,
    ) -> String {
        let expires = Utc::now().timestamp() + expires_in_secs as i64;
        let signature = hex::encode(
            self.mac(method, object_key, expires, download_name.unwrap_or_default())
                .finalize()
                .into_bytes(),
        );

        let mut url = format!(
            "{}/{}?method={}&expires={}&signature={}",
            self.base_url,
            utf8_percent_encode(object_key, PATH_ESCAPE),
            method,
            expires,
            signature
        );
        if let Some(name) = download_name {
            url.push_str("&filename=");
            url.push_str(&utf8_percent_encode(name, QUERY_ESCAPE).to_string());
        }
        url
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn issue_write_handle(
        &self,
        destination_hint: &str,
        content_type: &str,
        owner_id: &str,
        size_bytes: i64,
    ) -> StorageResult<WriteHandle> {
        self.policy.check(destination_hint, content_type, size_bytes)?;

        let object_key = generate_source_key(owner_id, destination_hint, Utc::now());
        let handle = self.signed_url("PUT", &object_key, self.upload_expiry_secs, None);

        tracing::debug!(key = %object_key, "Issued local write handle");

        Ok(WriteHandle {
            handle,
            object_key,
            expires_in_seconds: self.upload_expiry_secs,
        })
    }

    async fn issue_read_handle(
        &self,
        object_key: &str,
        download_name: &str,
    ) -> StorageResult<ReadHandle> {
        validate_key(object_key)?;
        let handle = self.signed_url(
            "GET",
            object_key,
            self.download_expiry_secs,
            Some(download_name),
        );
        Ok(ReadHandle {
            handle,
            expires_in_seconds: self.download_expiry_secs,
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
