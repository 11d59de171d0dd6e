//! Reelvault Core Library
//!
//! This crate provides the domain models, the upload lifecycle engine, error types,
//! configuration, and request validation shared across all Reelvault components.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, RecordStoreBackend, ServiceConfig};
pub use error::{AppError, ErrorMetadata, FieldError, LogLevel};
pub use lifecycle::{decide, Decision, IgnoreReason, LifecycleEvent, Transition};
pub use models::{UploadRecord, UploadStatus};
pub use storage_types::StorageBackend;
pub use validation::RequestValidator;
