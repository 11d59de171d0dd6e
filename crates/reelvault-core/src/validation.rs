//! Request validation
//!
//! Shape checks for incoming intake payloads. Policy checks that depend on
//! deployment configuration (size ceiling, MIME and extension allow-lists) belong
//! to the storage backend, which rejects with `PayloadRejected`.

use regex::Regex;
use std::sync::LazyLock;
use validator::Validate;

use crate::error::{AppError, FieldError};
use crate::models::CreateUploadRequest;

static SAFE_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._-]+$").expect("file name pattern is a valid regex")
});

/// Checks intake payloads and reports every offending field at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValidator;

impl RequestValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_create(&self, request: &CreateUploadRequest) -> Result<(), AppError> {
        let mut fields = match request.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => match AppError::from(errors) {
                AppError::ValidationFailed(fields) => fields,
                other => return Err(other),
            },
        };

        if !request.file_name.is_empty() {
            if !SAFE_FILE_NAME.is_match(&request.file_name) {
                fields.push(FieldError::new(
                    "file_name",
                    "File name must contain only letters, numbers, dots, hyphens and underscores",
                ));
            } else if !has_extension(&request.file_name) {
                fields.push(FieldError::new(
                    "file_name",
                    "File name must include an extension",
                ));
            }
        }

        if request.file_type.trim() != request.file_type {
            fields.push(FieldError::new(
                "file_type",
                "File type must not contain surrounding whitespace",
            ));
        }

        if fields.is_empty() {
            Ok(())
        } else {
            fields.sort_by(|a, b| a.field.cmp(&b.field));
            Err(AppError::ValidationFailed(fields))
        }
    }
}

fn has_extension(file_name: &str) -> bool {
    match file_name.rfind('.') {
        Some(idx) => idx > 0 && idx + 1 < file_name.len(),
        None => false,
    }
}
