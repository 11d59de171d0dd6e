//! Reelvault record store
//!
//! Persistence for upload records behind the [`UploadRecordStore`] trait, with a
//! PostgreSQL implementation for deployments and an in-memory one for local runs
//! and tests.

pub mod db;

pub use db::{
    clamp_list_limit, InMemoryUploadRecordStore, PostgresUploadRecordStore, StoreError,
    StoreResult, UploadRecordStore, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT,
};
