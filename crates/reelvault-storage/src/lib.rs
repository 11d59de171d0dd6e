//! Reelvault Storage Library
//!
//! This crate issues time-boxed upload and download handles for media objects.
//! Clients never stream bytes through the service: they PUT to a write handle and
//! GET from a read handle, both signed by the configured backend.
//!
//! # Storage key format
//!
//! Source keys are owner-scoped: `uploads/{owner_id}/{created_millis}-{random}-{file_name}`,
//! with the owner and file name sanitized to `[A-Za-z0-9.-]`. Key generation is
//! centralized in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod policy;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use policy::UploadPolicy;
pub use reelvault_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ReadHandle, Storage, StorageError, StorageResult, WriteHandle};
