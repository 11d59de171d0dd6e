//! Decoding of inbound notification documents.
//!
//! Storage notifications arrive as an object-store event document
//! (`{"Records":[{"eventName", "s3":{"object":{"key"}}}]}`). Processing
//! notifications arrive as a queue batch (`{"Records":[{"body"}]}`) whose bodies are
//! either the direct outcome shape or a topic envelope `{"Message": "<json>"}`
//! carrying `{eventType, payload}`.
//!
//! A malformed document fails as a whole. A malformed record inside a well-formed
//! document is counted as rejected and the rest of the batch still goes through.

use reelvault_core::models::{
    ObjectEventKind, ProcessingNotification, ProcessingOutcome, StorageNotification,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum NotificationDecodeError {
    #[error("Notification document is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Notification document has no Records array")]
    MissingRecords,
}

/// Notifications decoded from one document, plus the count of records that were unusable.
#[derive(Debug)]
pub struct DecodedBatch<T> {
    pub notifications: Vec<T>,
    pub rejected: usize,
}

#[derive(Deserialize)]
struct RecordsDocument {
    #[serde(rename = "Records")]
    records: Option<Vec<Value>>,
}

fn records(body: &[u8]) -> Result<Vec<Value>, NotificationDecodeError> {
    let document: RecordsDocument = serde_json::from_slice(body)?;
    document.records.ok_or(NotificationDecodeError::MissingRecords)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct S3EventRecord {
    event_name: String,
    s3: S3Entity,
}

#[derive(Deserialize)]
struct S3Entity {
    object: S3Object,
}

#[derive(Deserialize)]
struct S3Object {
    key: String,
}

pub fn decode_storage_event(
    body: &[u8],
) -> Result<DecodedBatch<StorageNotification>, NotificationDecodeError> {
    let mut batch = DecodedBatch {
        notifications: Vec::new(),
        rejected: 0,
    };

    for raw in records(body)? {
        let record: S3EventRecord = match serde_json::from_value(raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed storage event record");
                batch.rejected += 1;
                continue;
            }
        };

        let kind = if record.event_name.starts_with("ObjectCreated:") {
            ObjectEventKind::Created
        } else if record.event_name.starts_with("ObjectRemoved:") {
            ObjectEventKind::Removed
        } else {
            tracing::warn!(event_name = %record.event_name, "Skipping unsupported storage event");
            batch.rejected += 1;
            continue;
        };

        batch.notifications.push(StorageNotification {
            kind,
            object_key: record.s3.object.key,
        });
    }

    Ok(batch)
}

/// The direct outcome shape.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectOutcome {
    file_id: Option<String>,
    outcome: ProcessingOutcome,
    result_key: Option<String>,
    failure_reason: Option<String>,
    notify_address: Option<String>,
}

/// The topic envelope's inner document.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineEvent {
    event_type: String,
    payload: PipelinePayload,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelinePayload {
    file_id: Option<String>,
    processed_file_s3_key: Option<String>,
    error: Option<String>,
    user_id: Option<String>,
    notify_address: Option<String>,
}

fn outcome_for_event_type(event_type: &str) -> Option<ProcessingOutcome> {
    match event_type {
        "PROCESS_VIDEO_STARTED" => Some(ProcessingOutcome::Started),
        "PROCESS_VIDEO_COMPLETED" => Some(ProcessingOutcome::Completed),
        "PROCESS_VIDEO_FAILURE" => Some(ProcessingOutcome::Failed),
        _ => None,
    }
}

/// Decode one queue message body. `Err` carries a reason for the log line.
fn decode_processing_message(body: Value) -> Result<ProcessingNotification, String> {
    // Bodies are usually JSON text; tolerate an inline object too.
    let body = match body {
        Value::String(text) => serde_json::from_str::<Value>(&text).map_err(|e| e.to_string())?,
        other => other,
    };

    if let Some(message) = body.get("Message") {
        let inner = message
            .as_str()
            .ok_or_else(|| "Message is not a string".to_string())?;
        let event: PipelineEvent = serde_json::from_str(inner).map_err(|e| e.to_string())?;
        let outcome = outcome_for_event_type(&event.event_type)
            .ok_or_else(|| format!("unknown event type {}", event.event_type))?;
        let payload = event.payload;
        return Ok(ProcessingNotification {
            file_id: payload.file_id,
            outcome,
            result_key: payload.processed_file_s3_key,
            failure_reason: payload.error,
            notify_address: payload.notify_address.or(payload.user_id),
        });
    }

    let direct: DirectOutcome = serde_json::from_value(body).map_err(|e| e.to_string())?;
    Ok(ProcessingNotification {
        file_id: direct.file_id,
        outcome: direct.outcome,
        result_key: direct.result_key,
        failure_reason: direct.failure_reason,
        notify_address: direct.notify_address,
    })
}

pub fn decode_processing_batch(
    body: &[u8],
) -> Result<DecodedBatch<ProcessingNotification>, NotificationDecodeError> {
    let mut batch = DecodedBatch {
        notifications: Vec::new(),
        rejected: 0,
    };

    for raw in records(body)? {
        let Some(message_body) = raw.get("body").cloned() else {
            tracing::warn!("Skipping queue record without a body");
            batch.rejected += 1;
            continue;
        };

        match decode_processing_message(message_body) {
            Ok(notification) => batch.notifications.push(notification),
            Err(reason) => {
                tracing::warn!(reason = %reason, "Skipping malformed processing notification");
                batch.rejected += 1;
            }
        }
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn storage_event_document() {
        let body = json!({
            "Records": [
                {"eventName": "ObjectCreated:Put", "s3": {"bucket": {"name": "b"}, "object": {"key": "uploads/u1/1-abc-my+clip.mp4"}}},
                {"eventName": "ObjectRemoved:Delete", "s3": {"bucket": {"name": "b"}, "object": {"key": "uploads/u1/old.mp4"}}},
                {"eventName": "ObjectRestore:Post", "s3": {"bucket": {"name": "b"}, "object": {"key": "x"}}},
                {"eventName": "ObjectCreated:Put"}
            ]
        });
        let batch = decode_storage_event(body.to_string().as_bytes()).unwrap();
        assert_eq!(batch.rejected, 2);
        assert_eq!(
            batch.notifications,
            vec![
                StorageNotification {
                    kind: ObjectEventKind::Created,
                    object_key: "uploads/u1/1-abc-my+clip.mp4".to_string(),
                },
                StorageNotification {
                    kind: ObjectEventKind::Removed,
                    object_key: "uploads/u1/old.mp4".to_string(),
                },
            ]
        );
    }

    #[test]
    fn documents_without_records_fail_whole() {
        assert!(matches!(
            decode_storage_event(b"{}"),
            Err(NotificationDecodeError::MissingRecords)
        ));
        assert!(matches!(
            decode_processing_batch(b"not json"),
            Err(NotificationDecodeError::InvalidJson(_))
        ));
    }

    #[test]
    fn topic_envelope_is_unwrapped() {
        let inner = json!({
            "eventType": "PROCESS_VIDEO_FAILURE",
            "payload": {"fileId": "f1", "fileName": "clip.mp4", "userId": "owner@example.com", "s3Key": "k", "error": "codec"}
        });
        let body = json!({"Message": inner.to_string()});
        let batch = json!({"Records": [{"messageId": "m1", "body": body.to_string()}]});

        let decoded = decode_processing_batch(batch.to_string().as_bytes()).unwrap();
        assert_eq!(decoded.rejected, 0);
        assert_eq!(
            decoded.notifications,
            vec![ProcessingNotification {
                file_id: Some("f1".to_string()),
                outcome: ProcessingOutcome::Failed,
                result_key: None,
                failure_reason: Some("codec".to_string()),
                notify_address: Some("owner@example.com".to_string()),
            }]
        );
    }

    #[test]
    fn direct_shape_and_inline_bodies() {
        let batch = json!({"Records": [
            {"body": json!({"fileId": "f1", "outcome": "completed", "resultKey": "out/clip.zip"}).to_string()},
            {"body": {"fileId": "f2", "outcome": "started"}},
            {"body": json!({"outcome": "failed"}).to_string()}
        ]});
        let decoded = decode_processing_batch(batch.to_string().as_bytes()).unwrap();
        assert_eq!(decoded.rejected, 0);
        assert_eq!(decoded.notifications.len(), 3);
        assert_eq!(decoded.notifications[0].result_key.as_deref(), Some("out/clip.zip"));
        assert_eq!(decoded.notifications[1].outcome, ProcessingOutcome::Started);
        assert!(decoded.notifications[2].file_id.is_none());
    }

    #[test]
    fn malformed_messages_are_rejected_individually() {
        let unknown = json!({"Message": json!({"eventType": "PROCESS_VIDEO_PAUSED", "payload": {"fileId": "f1"}}).to_string()});
        let batch = json!({"Records": [
            {"body": "{not json"},
            {"body": unknown.to_string()},
            {"messageId": "no-body"},
            {"body": json!({"fileId": "f3", "outcome": "completed"}).to_string()}
        ]});
        let decoded = decode_processing_batch(batch.to_string().as_bytes()).unwrap();
        assert_eq!(decoded.rejected, 3);
        assert_eq!(decoded.notifications.len(), 1);
        assert_eq!(decoded.notifications[0].file_id.as_deref(), Some("f3"));
    }
}
