//! Failure notifications sent to the owner of an upload whose processing failed.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use reelvault_core::Config;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid recipient address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn notify_failure(&self, address: &str, file_name: &str) -> Result<(), NotifyError>;
}

/// Sender used when email alerts are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotificationSender;

#[async_trait]
impl NotificationSender for NoopNotificationSender {
    async fn notify_failure(&self, address: &str, file_name: &str) -> Result<(), NotifyError> {
        tracing::debug!(
            recipient = %address,
            file_name = %file_name,
            "Email alerts disabled, skipping failure notification"
        );
        Ok(())
    }
}

pub(crate) fn failure_subject() -> &'static str {
    "Video processing failed"
}

pub(crate) fn failure_body(file_name: &str, at: chrono::DateTime<chrono::Utc>) -> String {
    format!(
        "Hello,\n\n\
         Unfortunately an error occurred while processing your video.\n\n\
         File name: {}\n\
         Date/time: {}\n\n\
         Please try uploading it again.\n",
        file_name,
        at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// SMTP sender for failure notifications.
#[derive(Clone)]
pub struct EmailNotificationSender {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl EmailNotificationSender {
    /// Create the sender from config. Returns `None` if disabled or SMTP not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.email_alerts_enabled() {
            tracing::debug!("Email alerts disabled (EMAIL_ALERTS_ENABLED=false)");
            return None;
        }
        let host = config.smtp_host()?;
        let from: Mailbox = match config.smtp_from()?.parse() {
            Ok(from) => from,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid SMTP_FROM, email alerts disabled");
                return None;
            }
        };
        let port = config.smtp_port().unwrap_or(587);
        let credentials = match (config.smtp_user(), config.smtp_password()) {
            (Some(u), Some(p)) => Some(Credentials::new(u.to_string(), p.to_string())),
            _ => None,
        };

        let builder = if config.smtp_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .ok()?
                .port(port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port)
        };
        let builder = match credentials {
            Some(credentials) => builder.credentials(credentials),
            None => builder,
        };

        tracing::info!(
            host = %host,
            port = port,
            tls = config.smtp_tls(),
            "Email notification sender initialized"
        );

        Some(Self {
            mailer: Arc::new(builder.build()),
            from,
        })
    }
}

#[async_trait]
impl NotificationSender for EmailNotificationSender {
    async fn notify_failure(&self, address: &str, file_name: &str) -> Result<(), NotifyError> {
        let to: Mailbox = address
            .parse()
            .map_err(|_| NotifyError::InvalidAddress(address.to_string()))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(failure_subject())
            .header(ContentType::TEXT_PLAIN)
            .body(failure_body(file_name, chrono::Utc::now()))
            .map_err(|e| NotifyError::Message(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        tracing::info!(recipient = %address, file_name = %file_name, "Failure notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelvault_core::ServiceConfig;

    #[test]
    fn from_config_returns_none_when_email_disabled() {
        let config = Config(Box::new(ServiceConfig {
            smtp_host: Some("smtp.example.com".to_string()),
            smtp_from: Some("noreply@example.com".to_string()),
            ..ServiceConfig::default()
        }));
        assert!(EmailNotificationSender::from_config(&config).is_none());
    }

    #[tokio::test]
    async fn rejects_invalid_recipient() {
        let config = Config(Box::new(ServiceConfig {
            email_alerts_enabled: true,
            smtp_host: Some("localhost".to_string()),
            smtp_port: Some(2525),
            smtp_from: Some("noreply@example.com".to_string()),
            smtp_tls: false,
            ..ServiceConfig::default()
        }));
        let sender = EmailNotificationSender::from_config(&config).unwrap();
        let err = sender.notify_failure("not-an-email", "clip.mp4").await.unwrap_err();
        assert!(matches!(err, NotifyError::InvalidAddress(_)));
    }

    #[test]
    fn body_names_the_file() {
        let body = failure_body("clip.mp4", chrono::Utc::now());
        assert!(body.contains("File name: clip.mp4"));
        assert!(body.contains("try uploading it again"));
    }
}
