//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use reelvault_core::models;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "notification_key",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Reelvault API",
        version = "0.1.0",
        description = "Upload lifecycle service for video files: presigned uploads, storage and processing notifications, and owner-gated downloads. All endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::uploads::create_upload,
        handlers::uploads::list_uploads,
        handlers::uploads::get_upload,
        handlers::uploads::download_upload,
        handlers::notifications::storage_notification,
        handlers::notifications::processing_notification,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::CreateUploadRequest,
            models::CreateUploadResponse,
            models::UploadRecordResponse,
            models::UploadListResponse,
            models::DownloadResponse,
            models::BatchSummary,
            models::UploadStatus,
            handlers::health::HealthCheckResponse,
            error::ErrorResponse,
            reelvault_core::FieldError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "uploads", description = "Upload intake, listing and downloads"),
        (name = "notifications", description = "Inbound storage and processing notifications"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
