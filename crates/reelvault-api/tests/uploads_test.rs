//! Upload intake and access integration tests.
//!
//! Run with: `cargo test -p reelvault-api --test uploads_test`

mod helpers;

use helpers::{api_path, bearer_for, create_upload, setup_test_app};
use serde_json::{json, Value};

#[tokio::test]
async fn create_upload_issues_pending_record() {
    let app = setup_test_app().await;
    let created = create_upload(&app, "u1", "clip.mp4").await;

    assert_eq!(created["status"], "PENDING");
    assert_eq!(created["expires_in"], 3600);
    let file_key = created["file_key"].as_str().unwrap();
    assert!(file_key.starts_with("uploads/u1/"));
    assert!(file_key.ends_with("-clip.mp4"));
    let upload_url = created["upload_url"].as_str().unwrap();
    assert!(upload_url.starts_with("http://localhost:4000/files/"));
    assert!(upload_url.contains("method=PUT"));

    let file_id = created["file_id"].as_str().unwrap();
    let response = app
        .client()
        .get(&api_path(&format!("/uploads/{}", file_id)))
        .add_header("Authorization", bearer_for("u1"))
        .await;
    assert_eq!(response.status_code(), 200);
    let record = response.json::<Value>();
    assert_eq!(record["owner_id"], "u1");
    assert_eq!(record["source_key"], file_key);
    assert_eq!(record["upload_url"], upload_url);
    assert!(record.get("result_key").is_none());
}

#[tokio::test]
async fn invalid_fields_are_listed() {
    let app = setup_test_app().await;
    let response = app
        .client()
        .post(&api_path("/uploads"))
        .add_header("Authorization", bearer_for("u1"))
        .json(&json!({
            "file_name": "../clip.mp4",
            "file_type": "video/mp4",
            "file_size_bytes": 0
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body = response.json::<Value>();
    assert_eq!(body["code"], "BAD_REQUEST");
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"file_name"));
    assert!(fields.contains(&"file_size_bytes"));
    assert!(!fields.contains(&"file_type"));
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = setup_test_app().await;
    let response = app
        .client()
        .post(&api_path("/uploads"))
        .add_header("Authorization", bearer_for("u1"))
        .json(&json!({ "file_name": "clip.mp4" }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body = response.json::<Value>();
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn policy_violation_is_payload_rejected() {
    let app = setup_test_app().await;
    let response = app
        .client()
        .post(&api_path("/uploads"))
        .add_header("Authorization", bearer_for("u1"))
        .json(&json!({
            "file_name": "holiday.png",
            "file_type": "image/png",
            "file_size_bytes": 4096
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<Value>()["code"], "PAYLOAD_REJECTED");

    let listed = app
        .client()
        .get(&api_path("/uploads"))
        .add_header("Authorization", bearer_for("u1"))
        .await
        .json::<Value>();
    assert_eq!(listed["count"], 0);
}

#[tokio::test]
async fn list_is_owner_scoped_and_clamped() {
    let app = setup_test_app().await;
    for name in ["a.mp4", "b.mp4", "c.mp4"] {
        create_upload(&app, "u1", name).await;
    }
    create_upload(&app, "u2", "d.mp4").await;

    let all = app
        .client()
        .get(&api_path("/uploads"))
        .add_query_param("limit", 500)
        .add_header("Authorization", bearer_for("u1"))
        .await
        .json::<Value>();
    assert_eq!(all["limit"], 100);
    assert_eq!(all["count"], 3);
    assert!(all["records"]
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["owner_id"] == "u1"));

    let page = app
        .client()
        .get(&api_path("/uploads"))
        .add_query_param("limit", 2)
        .add_header("Authorization", bearer_for("u1"))
        .await
        .json::<Value>();
    assert_eq!(page["limit"], 2);
    assert_eq!(page["count"], 2);

    let default = app
        .client()
        .get(&api_path("/uploads"))
        .add_header("Authorization", bearer_for("u2"))
        .await
        .json::<Value>();
    assert_eq!(default["limit"], 50);
    assert_eq!(default["count"], 1);
}

#[tokio::test]
async fn other_owners_are_forbidden() {
    let app = setup_test_app().await;
    let created = create_upload(&app, "u1", "clip.mp4").await;
    let file_id = created["file_id"].as_str().unwrap();

    for path in [
        format!("/uploads/{}", file_id),
        format!("/uploads/{}/download", file_id),
    ] {
        let response = app
            .client()
            .get(&api_path(&path))
            .add_header("Authorization", bearer_for("u2"))
            .await;
        assert_eq!(response.status_code(), 403);
        assert_eq!(response.json::<Value>()["code"], "FORBIDDEN");
    }
}

#[tokio::test]
async fn download_before_completion_is_invalid_state() {
    let app = setup_test_app().await;
    let created = create_upload(&app, "u1", "clip.mp4").await;
    let file_id = created["file_id"].as_str().unwrap();

    let response = app
        .client()
        .get(&api_path(&format!("/uploads/{}/download", file_id)))
        .add_header("Authorization", bearer_for("u1"))
        .await;
    assert_eq!(response.status_code(), 409);
    let body = response.json::<Value>();
    assert_eq!(body["code"], "INVALID_STATE");
    assert!(body["error"].as_str().unwrap().contains("PENDING"));
}

#[tokio::test]
async fn unknown_upload_is_not_found() {
    let app = setup_test_app().await;
    let response = app
        .client()
        .get(&api_path(&format!("/uploads/{}", uuid::Uuid::new_v4())))
        .add_header("Authorization", bearer_for("u1"))
        .await;
    assert_eq!(response.status_code(), 404);
    assert_eq!(response.json::<Value>()["code"], "NOT_FOUND");
}

#[tokio::test]
async fn missing_or_invalid_credentials_are_unauthorized() {
    let app = setup_test_app().await;

    let missing = app.client().get(&api_path("/uploads")).await;
    assert_eq!(missing.status_code(), 401);
    assert_eq!(
        missing.json::<Value>()["error"],
        "Missing authorization header"
    );

    let wrong_scheme = app
        .client()
        .get(&api_path("/uploads"))
        .add_header("Authorization", "Basic dTE6cGFzcw==")
        .await;
    assert_eq!(wrong_scheme.status_code(), 401);
    assert_eq!(
        wrong_scheme.json::<Value>()["error"],
        "Invalid authorization header format"
    );

    let garbage = app
        .client()
        .get(&api_path("/uploads"))
        .add_header("Authorization", "Bearer not-a-jwt")
        .await;
    assert_eq!(garbage.status_code(), 401);
    assert_eq!(garbage.json::<Value>()["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn malformed_path_and_query_use_error_envelope() {
    let app = setup_test_app().await;

    for path in ["/uploads/not-a-uuid", "/uploads/not-a-uuid/download"] {
        let response = app
            .client()
            .get(&api_path(path))
            .add_header("Authorization", bearer_for("u1"))
            .await;
        assert_eq!(response.status_code(), 400);
        let body = response.json::<Value>();
        assert_eq!(body["code"], "BAD_REQUEST");
        assert_eq!(body["recoverable"], false);
    }

    let response = app
        .client()
        .get(&api_path("/uploads"))
        .add_query_param("limit", "abc")
        .add_header("Authorization", bearer_for("u1"))
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<Value>()["code"], "BAD_REQUEST");
}
