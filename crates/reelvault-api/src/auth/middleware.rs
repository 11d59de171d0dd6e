use crate::auth::identity::{Identity, IdentityVerifier};
use crate::error::HttpAppError;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use reelvault_core::AppError;
use std::sync::Arc;
use subtle::ConstantTimeEq;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn IdentityVerifier>,
}

/// Shared key the storage and processing pipelines present. `None` leaves the
/// notification endpoints open, which config validation forbids in production.
#[derive(Clone)]
pub struct NotificationAuthState {
    pub api_key: Option<String>,
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn bearer_token(request: &Request) -> Result<&str, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    // Owned: the request body is not Sync, so no borrow of it may live across an await.
    let token = match bearer_token(&request) {
        Ok(token) => token.to_string(),
        Err(e) => return HttpAppError(e).into_response(),
    };

    let identity = match auth_state.verifier.authenticate(&token).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::debug!(error = %e, "Token rejected");
            return HttpAppError(e).into_response();
        }
    };

    tracing::debug!(subject_id = %identity.subject_id, "Request authenticated");
    request.extensions_mut().insert(identity);
    next.run(request).await
}

pub async fn notification_auth_middleware(
    State(auth_state): State<Arc<NotificationAuthState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = auth_state.api_key.as_deref() else {
        return next.run(request).await;
    };

    let token = match bearer_token(&request) {
        Ok(token) => token,
        Err(e) => return HttpAppError(e).into_response(),
    };

    if !secure_compare(token, expected) {
        tracing::warn!("Notification request with invalid API key");
        return HttpAppError(AppError::Unauthorized("Invalid notification API key".to_string()))
            .into_response();
    }

    next.run(request).await
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Identity>().cloned().ok_or_else(|| {
            HttpAppError(AppError::Unauthorized("Missing caller identity".to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_compare_checks_length_and_content() {
        assert!(secure_compare("notification-key", "notification-key"));
        assert!(!secure_compare("notification-key", "notification-kez"));
        assert!(!secure_compare("short", "notification-key"));
    }
}
