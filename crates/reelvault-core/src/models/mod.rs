//! Data models for the application
//!
//! `upload` holds the persisted record and its status; `intake` holds the
//! request/response shapes exchanged over the HTTP boundary.

mod intake;
mod notification;
mod upload;

pub use intake::*;
pub use notification::*;
pub use upload::*;
