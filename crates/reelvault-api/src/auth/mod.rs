//! Caller authentication
//!
//! End users authenticate with an HS256 bearer JWT whose `sub` becomes the owner id
//! of everything they create. The notification endpoints take a shared API key
//! instead.

pub mod identity;
pub mod middleware;

pub use identity::{Identity, IdentityVerifier, JwtIdentityVerifier};
pub use middleware::{
    auth_middleware, notification_auth_middleware, AuthState, NotificationAuthState,
};
