//! Reelvault API Library
//!
//! This crate provides the HTTP handlers, authentication middleware, and the
//! application setup that wires the services together.

mod api_doc;
pub mod constants;
mod handlers;
pub mod middleware;
pub mod setup;
pub mod telemetry;

pub mod auth;
pub mod error;
pub mod state;

pub use error::ErrorResponse;
