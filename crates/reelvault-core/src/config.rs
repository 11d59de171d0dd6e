//! Configuration module
//!
//! Configuration is read once from the environment (with `.env` support) and
//! validated before anything else starts.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const UPLOAD_URL_EXPIRY_SECS: u64 = 3600;
const DOWNLOAD_URL_EXPIRY_SECS: u64 = 3600;
const RECORD_RETENTION_HOURS: i64 = 24;
const MAX_UPLOAD_SIZE_MB: u64 = 1024;
const LISTENER_CONCURRENCY: usize = 8;
const HANDLE_REAPER_INTERVAL_SECS: u64 = 300;
const DEFAULT_CONTENT_TYPES: &str = "video/mp4,video/avi,video/mov,video/wmv,video/flv,video/webm,video/mkv,video/m4v,video/3gp,video/quicktime";
const DEFAULT_EXTENSIONS: &str = "mp4,avi,mov,wmv,flv,webm,mkv,m4v,3gp";

/// Where upload records are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStoreBackend {
    Postgres,
    /// Process-local store; records vanish on restart.
    Memory,
}

impl FromStr for RecordStoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(RecordStoreBackend::Postgres),
            "memory" => Ok(RecordStoreBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid record store: {}", s)),
        }
    }
}

impl Display for RecordStoreBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RecordStoreBackend::Postgres => write!(f, "postgres"),
            RecordStoreBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Upload lifecycle service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    // Record store
    pub record_store: RecordStoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Authentication
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    /// Bearer key the storage and processing pipelines present on notification endpoints
    pub notification_api_key: Option<String>,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub aws_region: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub local_storage_signing_key: Option<String>,
    // Upload lifecycle
    pub upload_url_expiry_secs: u64,
    pub download_url_expiry_secs: u64,
    pub record_retention_hours: i64,
    pub max_upload_size_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub allowed_extensions: Vec<String>,
    pub listener_concurrency: usize,
    /// Interval between upload-handle reaper runs. 0 = disabled.
    pub handle_reaper_interval_secs: u64,
    // Failure notifications
    pub email_alerts_enabled: bool,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
    // Upload-confirmed events
    pub event_webhook_url: Option<String>,
    pub event_webhook_secret: Option<String>,
}

impl Default for ServiceConfig {
    /// Development defaults: in-memory records, local storage, no outbound notifications.
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            record_store: RecordStoreBackend::Memory,
            database_url: None,
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            jwt_secret: String::new(),
            jwt_issuer: None,
            jwt_audience: None,
            notification_api_key: None,
            storage_backend: StorageBackend::Local,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_base_url: None,
            local_storage_signing_key: None,
            upload_url_expiry_secs: UPLOAD_URL_EXPIRY_SECS,
            download_url_expiry_secs: DOWNLOAD_URL_EXPIRY_SECS,
            record_retention_hours: RECORD_RETENTION_HOURS,
            max_upload_size_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            allowed_content_types: split_list(DEFAULT_CONTENT_TYPES),
            allowed_extensions: split_list(DEFAULT_EXTENSIONS),
            listener_concurrency: LISTENER_CONCURRENCY,
            handle_reaper_interval_secs: HANDLE_REAPER_INTERVAL_SECS,
            email_alerts_enabled: false,
            smtp_host: None,
            smtp_port: None,
            smtp_user: None,
            smtp_password: None,
            smtp_from: None,
            smtp_tls: true,
            event_webhook_url: None,
            event_webhook_secret: None,
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    fn inner(&self) -> &ServiceConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.inner().server_port
    }

    pub fn environment(&self) -> &str {
        &self.inner().environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().cors_origins
    }

    pub fn record_store(&self) -> RecordStoreBackend {
        self.inner().record_store
    }

    pub fn database_url(&self) -> Option<&str> {
        self.inner().database_url.as_deref()
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().jwt_secret
    }

    pub fn jwt_issuer(&self) -> Option<&str> {
        self.inner().jwt_issuer.as_deref()
    }

    pub fn jwt_audience(&self) -> Option<&str> {
        self.inner().jwt_audience.as_deref()
    }

    pub fn notification_api_key(&self) -> Option<&str> {
        self.inner().notification_api_key.as_deref()
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().aws_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn local_storage_signing_key(&self) -> Option<&str> {
        self.inner().local_storage_signing_key.as_deref()
    }

    pub fn upload_url_expiry_secs(&self) -> u64 {
        self.inner().upload_url_expiry_secs
    }

    pub fn download_url_expiry_secs(&self) -> u64 {
        self.inner().download_url_expiry_secs
    }

    pub fn record_retention_hours(&self) -> i64 {
        self.inner().record_retention_hours
    }

    pub fn max_upload_size_bytes(&self) -> u64 {
        self.inner().max_upload_size_bytes
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.inner().allowed_content_types
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.inner().allowed_extensions
    }

    pub fn listener_concurrency(&self) -> usize {
        self.inner().listener_concurrency
    }

    pub fn handle_reaper_interval_secs(&self) -> u64 {
        self.inner().handle_reaper_interval_secs
    }

    pub fn email_alerts_enabled(&self) -> bool {
        self.inner().email_alerts_enabled
    }

    pub fn smtp_host(&self) -> Option<&str> {
        self.inner().smtp_host.as_deref()
    }

    pub fn smtp_port(&self) -> Option<u16> {
        self.inner().smtp_port
    }

    pub fn smtp_user(&self) -> Option<&str> {
        self.inner().smtp_user.as_deref()
    }

    pub fn smtp_password(&self) -> Option<&str> {
        self.inner().smtp_password.as_deref()
    }

    pub fn smtp_from(&self) -> Option<&str> {
        self.inner().smtp_from.as_deref()
    }

    pub fn smtp_tls(&self) -> bool {
        self.inner().smtp_tls
    }

    pub fn event_webhook_url(&self) -> Option<&str> {
        self.inner().event_webhook_url.as_deref()
    }

    pub fn event_webhook_secret(&self) -> Option<&str> {
        self.inner().event_webhook_secret.as_deref()
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let record_store = env::var("RECORD_STORE")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse::<RecordStoreBackend>()?;

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .parse::<StorageBackend>()?;

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let config = ServiceConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            record_store,
            database_url: non_empty("DATABASE_URL"),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            jwt_issuer: non_empty("JWT_ISSUER"),
            jwt_audience: non_empty("JWT_AUDIENCE"),
            notification_api_key: non_empty("NOTIFICATION_API_KEY"),
            storage_backend,
            s3_bucket: non_empty("S3_BUCKET"),
            s3_region: non_empty("S3_REGION"),
            s3_endpoint: non_empty("S3_ENDPOINT"),
            aws_region: non_empty("AWS_REGION"),
            local_storage_base_url: non_empty("LOCAL_STORAGE_BASE_URL"),
            local_storage_signing_key: non_empty("LOCAL_STORAGE_SIGNING_KEY"),
            upload_url_expiry_secs: env::var("UPLOAD_URL_EXPIRY_SECS")
                .unwrap_or_else(|_| UPLOAD_URL_EXPIRY_SECS.to_string())
                .parse()
                .unwrap_or(UPLOAD_URL_EXPIRY_SECS),
            download_url_expiry_secs: env::var("DOWNLOAD_URL_EXPIRY_SECS")
                .unwrap_or_else(|_| DOWNLOAD_URL_EXPIRY_SECS.to_string())
                .parse()
                .unwrap_or(DOWNLOAD_URL_EXPIRY_SECS),
            record_retention_hours: env::var("RECORD_RETENTION_HOURS")
                .unwrap_or_else(|_| RECORD_RETENTION_HOURS.to_string())
                .parse()
                .unwrap_or(RECORD_RETENTION_HOURS),
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            allowed_content_types: split_list(
                &env::var("ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|_| DEFAULT_CONTENT_TYPES.to_string()),
            ),
            allowed_extensions: split_list(
                &env::var("ALLOWED_EXTENSIONS").unwrap_or_else(|_| DEFAULT_EXTENSIONS.to_string()),
            ),
            listener_concurrency: env::var("LISTENER_CONCURRENCY")
                .unwrap_or_else(|_| LISTENER_CONCURRENCY.to_string())
                .parse()
                .unwrap_or(LISTENER_CONCURRENCY),
            handle_reaper_interval_secs: env::var("HANDLE_REAPER_INTERVAL_SECS")
                .unwrap_or_else(|_| HANDLE_REAPER_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(HANDLE_REAPER_INTERVAL_SECS),
            email_alerts_enabled: env::var("EMAIL_ALERTS_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
            smtp_host: non_empty("SMTP_HOST"),
            smtp_port: env::var("SMTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&p| p > 0),
            smtp_user: non_empty("SMTP_USER"),
            smtp_password: non_empty("SMTP_PASSWORD"),
            smtp_from: non_empty("SMTP_FROM"),
            smtp_tls: env::var("SMTP_TLS")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            event_webhook_url: non_empty("EVENT_WEBHOOK_URL"),
            event_webhook_secret: non_empty("EVENT_WEBHOOK_SECRET"),
        };

        config.validate()?;
        Ok(config)
    }

    fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if self.is_production() {
            if self.cors_origins.iter().any(|o| o == "*") {
                return Err(anyhow::anyhow!(
                    "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
                ));
            }
            if self.notification_api_key.is_none() {
                return Err(anyhow::anyhow!(
                    "NOTIFICATION_API_KEY must be set in production"
                ));
            }
        }

        if self.record_store == RecordStoreBackend::Postgres {
            match self.database_url.as_deref() {
                Some(url)
                    if url.starts_with("postgres://") || url.starts_with("postgresql://") => {}
                _ => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string when RECORD_STORE=postgres"
                    ))
                }
            }
        }

        if self.listener_concurrency == 0 {
            return Err(anyhow::anyhow!("LISTENER_CONCURRENCY cannot be 0"));
        }

        if self.upload_url_expiry_secs == 0 || self.download_url_expiry_secs == 0 {
            return Err(anyhow::anyhow!("URL expiry cannot be 0"));
        }

        if self.email_alerts_enabled && (self.smtp_host.is_none() || self.smtp_from.is_none()) {
            return Err(anyhow::anyhow!(
                "EMAIL_ALERTS_ENABLED=true requires SMTP_HOST and SMTP_FROM to be set"
            ));
        }

        if self.event_webhook_url.is_some() && self.event_webhook_secret.is_none() {
            return Err(anyhow::anyhow!(
                "EVENT_WEBHOOK_URL requires EVENT_WEBHOOK_SECRET to be set"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
                if self.local_storage_signing_key.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_SIGNING_KEY must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ServiceConfig {
        ServiceConfig {
            jwt_secret: "test-secret-key-min-32-characters-long".to_string(),
            local_storage_base_url: Some("http://localhost:4000/objects".to_string()),
            local_storage_signing_key: Some("local-signing-key".to_string()),
            ..ServiceConfig::default()
        }
    }

    #[test]
    fn defaults_match_upload_policy() {
        let config = ServiceConfig::default();
        assert_eq!(config.max_upload_size_bytes, 1024 * 1024 * 1024);
        assert_eq!(config.upload_url_expiry_secs, 3600);
        assert_eq!(config.record_retention_hours, 24);
        assert!(config
            .allowed_content_types
            .contains(&"video/quicktime".to_string()));
        assert!(config.allowed_extensions.contains(&"3gp".to_string()));
        assert_eq!(config.allowed_extensions.len(), 9);
    }

    #[test]
    fn short_jwt_secret_is_rejected() {
        let config = ServiceConfig {
            jwt_secret: "short".to_string(),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn postgres_store_requires_database_url() {
        let mut config = valid();
        config.record_store = RecordStoreBackend::Postgres;
        assert!(config.validate().is_err());
        config.database_url = Some("postgresql://localhost/reelvault".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn s3_requires_bucket_and_region() {
        let mut config = valid();
        config.storage_backend = StorageBackend::S3;
        assert!(config.validate().is_err());
        config.s3_bucket = Some("media".to_string());
        assert!(config.validate().is_err());
        config.aws_region = Some("us-east-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn production_requires_notification_key_and_explicit_cors() {
        let mut config = valid();
        config.environment = "production".to_string();
        assert!(config.validate().is_err());
        config.cors_origins = vec!["https://app.example.com".to_string()];
        assert!(config.validate().is_err());
        config.notification_api_key = Some("pipeline-key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn record_store_parses() {
        assert_eq!(
            "memory".parse::<RecordStoreBackend>().unwrap(),
            RecordStoreBackend::Memory
        );
        assert_eq!(
            "PostgreSQL".parse::<RecordStoreBackend>().unwrap(),
            RecordStoreBackend::Postgres
        );
        assert!("dynamo".parse::<RecordStoreBackend>().is_err());
    }
}
