//! Route configuration and setup

use crate::auth::{auth_middleware, notification_auth_middleware, AuthState, NotificationAuthState};
use crate::constants::API_PREFIX;
use crate::handlers;
use crate::middleware::request_id_middleware;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use reelvault_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Notification documents and intake bodies are small; uploads go straight to storage.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config);

    let auth_state = Arc::new(AuthState {
        verifier: state.verifier.clone(),
    });
    let notification_auth_state = Arc::new(NotificationAuthState {
        api_key: config.notification_api_key().map(String::from),
    });

    let protected = upload_routes().layer(axum::middleware::from_fn_with_state(
        auth_state,
        auth_middleware,
    ));
    let notifications = notification_routes().layer(axum::middleware::from_fn_with_state(
        notification_auth_state,
        notification_auth_middleware,
    ));

    // Server-level concurrency limit to protect against resource exhaustion under extreme load
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);

    let app = public_routes()
        .merge(protected)
        .merge(notifications)
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins()
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    }
}

/// Public routes (no authentication required)
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/live", get(handlers::health::liveness_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
}

/// Upload routes (bearer JWT)
fn upload_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/uploads", API_PREFIX),
            post(handlers::uploads::create_upload).get(handlers::uploads::list_uploads),
        )
        .route(
            &format!("{}/uploads/{{file_id}}", API_PREFIX),
            get(handlers::uploads::get_upload),
        )
        .route(
            &format!("{}/uploads/{{file_id}}/download", API_PREFIX),
            get(handlers::uploads::download_upload),
        )
}

/// Notification routes (shared notification API key)
fn notification_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/notifications/storage", API_PREFIX),
            post(handlers::notifications::storage_notification),
        )
        .route(
            &format!("{}/notifications/processing", API_PREFIX),
            post(handlers::notifications::processing_notification),
        )
}
