//! Test helpers: build the application state and router for integration tests.
//!
//! Everything runs in process: in-memory record store, locally signed storage
//! URLs, and no outbound email or webhooks.

#![allow(dead_code)]

use axum_test::TestServer;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reelvault_api::constants;
use reelvault_api::setup::{routes, services};
use reelvault_api::state::AppState;
use reelvault_core::{Config, RecordStoreBackend, ServiceConfig, StorageBackend};
use reelvault_db::{InMemoryUploadRecordStore, UploadRecordStore};
use reelvault_services::create_storage;
use serde_json::{json, Value};
use std::sync::Arc;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters";
pub const TEST_NOTIFICATION_KEY: &str = "test-notification-key";

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn store(&self) -> &Arc<dyn UploadRecordStore> {
        &self.state.store
    }
}

pub fn test_config() -> Config {
    Config(Box::new(ServiceConfig {
        record_store: RecordStoreBackend::Memory,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        notification_api_key: Some(TEST_NOTIFICATION_KEY.to_string()),
        storage_backend: StorageBackend::Local,
        local_storage_base_url: Some("http://localhost:4000/files".to_string()),
        local_storage_signing_key: Some("test-signing-key".to_string()),
        handle_reaper_interval_secs: 0,
        ..ServiceConfig::default()
    }))
}

pub async fn setup_test_app() -> TestApp {
    let config = test_config();
    config.validate().expect("test config is valid");

    let store: Arc<dyn UploadRecordStore> = Arc::new(InMemoryUploadRecordStore::new());
    let storage = create_storage(&config).expect("Failed to create local storage");
    let state = services::initialize_services(&config, store, storage)
        .expect("Failed to initialize services");
    let router = routes::setup_routes(&config, state.clone()).expect("Failed to build routes");

    TestApp {
        server: TestServer::new(router.into_make_service()).expect("Failed to create test server"),
        state,
    }
}

/// Bearer header value for a user with subject `sub`.
pub fn bearer_for(sub: &str) -> String {
    let claims = json!({
        "sub": sub,
        "email": format!("{}@example.com", sub),
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token");
    format!("Bearer {}", token)
}

pub fn notification_bearer() -> String {
    format!("Bearer {}", TEST_NOTIFICATION_KEY)
}

/// Object-store event document announcing `key` was written.
pub fn object_created(key: &str) -> Value {
    json!({
        "Records": [{
            "eventName": "ObjectCreated:Put",
            "s3": {"bucket": {"name": "reelvault-uploads"}, "object": {"key": key}}
        }]
    })
}

/// Queue batch carrying one direct-shape processing outcome.
pub fn processing_outcome(outcome: Value) -> Value {
    json!({ "Records": [{ "body": outcome.to_string() }] })
}

/// POST /uploads as `sub`; returns the response body.
pub async fn create_upload(app: &TestApp, sub: &str, file_name: &str) -> Value {
    let response = app
        .client()
        .post(&api_path("/uploads"))
        .add_header("Authorization", bearer_for(sub))
        .json(&json!({
            "file_name": file_name,
            "file_type": "video/mp4",
            "file_size_bytes": 4096
        }))
        .await;
    assert_eq!(response.status_code(), 201, "{}", response.text());
    response.json::<Value>()
}

pub async fn notify_storage(app: &TestApp, document: &Value) -> Value {
    let response = app
        .client()
        .post(&api_path("/notifications/storage"))
        .add_header("Authorization", notification_bearer())
        .json(document)
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    response.json::<Value>()
}

pub async fn notify_processing(app: &TestApp, document: &Value) -> Value {
    let response = app
        .client()
        .post(&api_path("/notifications/processing"))
        .add_header("Authorization", notification_bearer())
        .json(document)
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    response.json::<Value>()
}
