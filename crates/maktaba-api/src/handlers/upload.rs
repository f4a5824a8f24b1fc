//! Shared multipart helpers for file upload endpoints.

use axum::extract::Multipart;
use maktaba_core::AppError;

/// Pull the `file` field out of a multipart body, enforcing the size limit.
/// Returns the raw bytes and the part's declared content type.
pub async fn read_file_field(
    mut multipart: Multipart,
    max_size: usize,
) -> Result<(Vec<u8>, Option<String>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read file field: {}", e)))?;

        if data.len() > max_size {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds maximum size of {} bytes",
                max_size
            )));
        }
        if data.is_empty() {
            return Err(AppError::InvalidInput("Uploaded file is empty".to_string()));
        }

        return Ok((data.to_vec(), content_type));
    }

    Err(AppError::InvalidInput(
        "Missing 'file' field in multipart body".to_string(),
    ))
}

/// Case-insensitive content-type match ignoring parameters
/// (`video/mp4; codecs=...` matches `video/mp4`).
pub fn content_type_matches(declared: &str, expected: &str) -> bool {
    declared
        .split(';')
        .next()
        .map(|mime| mime.trim().eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}
