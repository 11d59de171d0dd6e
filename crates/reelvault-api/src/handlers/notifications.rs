//! Inbound notifications from the object store and the processing pipeline.
//!
//! A document that is not a `Records` batch at all is rejected with 400 so the
//! sender can dead-letter it. Once decoded, per-record problems never fail the
//! request; they show up in the returned [`BatchSummary`].

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{body::Bytes, extract::State, response::IntoResponse, Json};
use reelvault_core::models::BatchSummary;
use reelvault_core::AppError;
use reelvault_services::{decode_processing_batch, decode_storage_event, NotificationDecodeError};
use std::sync::Arc;

fn decode_error(err: NotificationDecodeError) -> HttpAppError {
    HttpAppError(AppError::InvalidInput(err.to_string()))
}

/// Object-store event document (`ObjectCreated:*` confirms an upload)
#[utoipa::path(
    post,
    path = "/api/v0/notifications/storage",
    tag = "notifications",
    request_body(content = serde_json::Value, description = "Object-store event document with a Records array"),
    responses(
        (status = 200, description = "Batch processed", body = BatchSummary),
        (status = 400, description = "Not a notification document", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("notification_key" = []))
)]
#[tracing::instrument(skip(state, body), fields(body_bytes = body.len()))]
pub async fn storage_notification(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    let batch = decode_storage_event(&body).map_err(decode_error)?;
    let summary = state
        .confirmation
        .handle_batch(batch.notifications)
        .await
        .with_rejected(batch.rejected);

    Ok(Json(summary))
}

/// Processing-pipeline queue batch (started, completed or failed outcomes)
#[utoipa::path(
    post,
    path = "/api/v0/notifications/processing",
    tag = "notifications",
    request_body(content = serde_json::Value, description = "Queue batch with a Records array of message bodies"),
    responses(
        (status = 200, description = "Batch processed", body = BatchSummary),
        (status = 400, description = "Not a notification document", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("notification_key" = []))
)]
#[tracing::instrument(skip(state, body), fields(body_bytes = body.len()))]
pub async fn processing_notification(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    let batch = decode_processing_batch(&body).map_err(decode_error)?;
    let summary = state
        .completion
        .handle_batch(batch.notifications)
        .await
        .with_rejected(batch.rejected);

    Ok(Json(summary))
}
