//! Upload record repositories
//!
//! `store` defines the trait and its error type; `postgres` and `memory` are the
//! two backends. Every mutation is atomic per record and conditional: writes never
//! overwrite an existing record and status changes only land if the record is
//! still in the status the lifecycle engine decided from.

mod memory;
mod postgres;
mod store;

pub use memory::InMemoryUploadRecordStore;
pub use postgres::PostgresUploadRecordStore;
pub use store::{
    clamp_list_limit, StoreError, StoreResult, UploadRecordStore, DEFAULT_LIST_LIMIT,
    MAX_LIST_LIMIT,
};
