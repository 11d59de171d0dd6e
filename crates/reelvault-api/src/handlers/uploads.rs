use crate::auth::Identity;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson, ValidatedPath, ValidatedQuery};
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use reelvault_core::models::{
    CreateUploadRequest, CreateUploadResponse, DownloadResponse, ListUploadsQuery,
    UploadListResponse, UploadRecordResponse,
};
use std::sync::Arc;
use uuid::Uuid;

/// Issue a presigned upload URL and start tracking the upload
#[utoipa::path(
    post,
    path = "/api/v0/uploads",
    tag = "uploads",
    request_body = CreateUploadRequest,
    responses(
        (status = 201, description = "Upload URL issued", body = CreateUploadResponse),
        (status = 400, description = "Invalid request or rejected by the upload policy", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, request),
    fields(owner_id = %identity.subject_id, operation = "create_upload")
)]
pub async fn create_upload(
    identity: Identity,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = state
        .intake
        .create_upload(&identity.subject_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// List the caller's uploads, newest first
#[utoipa::path(
    get,
    path = "/api/v0/uploads",
    tag = "uploads",
    params(
        ("limit" = Option<i64>, Query, description = "Page size, clamped to 1..=100 (default 50)")
    ),
    responses(
        (status = 200, description = "Uploads owned by the caller", body = UploadListResponse),
        (status = 400, description = "Malformed query string", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, query), fields(owner_id = %identity.subject_id))]
pub async fn list_uploads(
    identity: Identity,
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<ListUploadsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (records, limit) = state
        .access
        .list_owned(&identity.subject_id, query.limit)
        .await?;

    let records: Vec<UploadRecordResponse> = records.into_iter().map(Into::into).collect();
    Ok(Json(UploadListResponse {
        count: records.len(),
        records,
        limit,
    }))
}

/// Get one of the caller's uploads
#[utoipa::path(
    get,
    path = "/api/v0/uploads/{file_id}",
    tag = "uploads",
    params(
        ("file_id" = Uuid, Path, description = "Upload ID")
    ),
    responses(
        (status = 200, description = "Upload found", body = UploadRecordResponse),
        (status = 400, description = "Malformed upload ID", body = ErrorResponse),
        (status = 403, description = "Upload belongs to someone else", body = ErrorResponse),
        (status = 404, description = "Upload not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(owner_id = %identity.subject_id))]
pub async fn get_upload(
    identity: Identity,
    State(state): State<Arc<AppState>>,
    ValidatedPath(file_id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state.access.read(file_id, &identity.subject_id).await?;
    Ok(Json(UploadRecordResponse::from(record)))
}

/// Issue a download URL for a processed upload
#[utoipa::path(
    get,
    path = "/api/v0/uploads/{file_id}/download",
    tag = "uploads",
    params(
        ("file_id" = Uuid, Path, description = "Upload ID")
    ),
    responses(
        (status = 200, description = "Download URL issued", body = DownloadResponse),
        (status = 400, description = "Malformed upload ID", body = ErrorResponse),
        (status = 403, description = "Upload belongs to someone else", body = ErrorResponse),
        (status = 404, description = "Upload not found", body = ErrorResponse),
        (status = 409, description = "Upload has not finished processing", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(owner_id = %identity.subject_id))]
pub async fn download_upload(
    identity: Identity,
    State(state): State<Arc<AppState>>,
    ValidatedPath(file_id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let download = state
        .access
        .get_download(file_id, &identity.subject_id)
        .await?;
    Ok(Json(download))
}
