//! Upload-confirmed events
//!
//! After a record moves PENDING→UPLOADED the confirmation listener publishes a
//! `FILE_UPLOADED` event. Delivery is best effort: a failed publish is logged by
//! the caller and never undoes the transition.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reelvault_core::models::UploadRecordResponse;
use reelvault_core::{Config, UploadRecord};
use reqwest::Client;
use serde::Serialize;
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

pub const FILE_UPLOADED: &str = "FILE_UPLOADED";
pub const SIGNATURE_HEADER: &str = "X-Reelvault-Signature";

const WEBHOOK_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize)]
pub struct UploadEvent {
    pub event_type: &'static str,
    pub payload: UploadRecordResponse,
    pub timestamp: DateTime<Utc>,
}

impl UploadEvent {
    pub fn file_uploaded(record: UploadRecord) -> Self {
        Self {
            event_type: FILE_UPLOADED,
            payload: record.into(),
            timestamp: Utc::now(),
        }
    }
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &UploadEvent) -> Result<()>;
}

/// Publisher used when no webhook is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish(&self, event: &UploadEvent) -> Result<()> {
        tracing::debug!(
            event_type = event.event_type,
            file_id = %event.payload.file_id,
            "No event publisher configured, dropping event"
        );
        Ok(())
    }
}

/// POSTs events as JSON, signed with HMAC-SHA256 over the body.
#[derive(Clone)]
pub struct WebhookEventPublisher {
    http_client: Client,
    url: String,
    secret: String,
}

impl WebhookEventPublisher {
    pub fn new(url: String, secret: String) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client for event webhook")?;

        Ok(Self {
            http_client,
            url,
            secret,
        })
    }

    /// Returns `None` when `EVENT_WEBHOOK_URL` is unset.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let Some(url) = config.event_webhook_url() else {
            return Ok(None);
        };
        let secret = config
            .event_webhook_secret()
            .context("EVENT_WEBHOOK_SECRET is required when EVENT_WEBHOOK_URL is set")?;
        Self::new(url.to_string(), secret.to_string()).map(Some)
    }

    fn sign_payload(&self, body: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC accepts any key size");
        mac.update(body.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

#[async_trait]
impl EventPublisher for WebhookEventPublisher {
    #[tracing::instrument(skip(self, event), fields(event_type = event.event_type, file_id = %event.payload.file_id))]
    async fn publish(&self, event: &UploadEvent) -> Result<()> {
        let body = serde_json::to_string(event).context("Failed to serialize event")?;
        let signature = self.sign_payload(&body);

        let response = self
            .http_client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("User-Agent", "Reelvault-Events/1.0")
            .header(SIGNATURE_HEADER, format!("v1={}", signature))
            .body(body)
            .send()
            .await
            .context("Failed to send event webhook")?;

        let status = response.status();
        if !status.is_success() {
            let response_body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("Failed to read response body"));
            return Err(anyhow::anyhow!(
                "Event webhook returned non-2xx status: {} - {}",
                status.as_u16(),
                response_body
            ));
        }

        tracing::info!("Event delivered");
        Ok(())
    }
}
