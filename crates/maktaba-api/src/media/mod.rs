//! Range-capable media serving.
//!
//! Serves stored book PDFs and video files either whole (200) or as a
//! satisfiable byte-range slice (206), with inline disposition and private
//! caching. Errors on this surface are plain text and never leak filesystem
//! paths.

pub mod range;

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use maktaba_storage::{Storage, StorageError};

use range::parse_range;

/// What kind of asset is being served; fixes content type, download
/// extension, and the counting policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    BookPdf,
    VideoMp4,
}

impl MediaKind {
    pub fn content_type(self) -> &'static str {
        match self {
            MediaKind::BookPdf => "application/pdf",
            MediaKind::VideoMp4 => "video/mp4",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::BookPdf => "pdf",
            MediaKind::VideoMp4 => "mp4",
        }
    }
}

/// Decide whether this request is the "fresh" one that bumps the usage
/// counter. Range-seeking clients issue many requests for one logical
/// view, so the policy differs by asset type:
///
/// - Documents are fetched whole by download clients; only a request with
///   no Range header counts.
/// - Video players open playback with a `bytes=0-` probe; exactly that
///   request counts, later seeks do not.
pub fn should_count(kind: MediaKind, range_header: Option<&str>) -> bool {
    match kind {
        MediaKind::BookPdf => range_header.is_none(),
        MediaKind::VideoMp4 => range_header == Some("bytes=0-"),
    }
}

/// A record's stored file, resolved and ready to serve.
pub struct AssetFile<'a> {
    pub title: &'a str,
    pub storage_key: &'a str,
    pub kind: MediaKind,
}

pub fn plain_error(status: StatusCode, message: &str) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(message.to_string()))
        .expect("static error response")
}

fn content_disposition(title: &str, extension: &str) -> String {
    format!(
        "inline; filename=\"{}.{}\"",
        urlencoding::encode(title),
        extension
    )
}

/// Serve the asset, honoring an optional Range header.
///
/// The caller has already gated on record existence, the active flag, and a
/// non-empty stored path; this function handles the filesystem and range
/// protocol. Storage-level failures map to plain-text errors: unknown file
/// 404, confinement violation 403, anything else 500 with a generic message.
pub async fn serve_file(
    storage: &dyn Storage,
    asset: AssetFile<'_>,
    range_header: Option<&str>,
) -> Response {
    let meta = match storage.stat(asset.storage_key).await {
        Ok(meta) => meta,
        Err(StorageError::NotFound(_)) => {
            return plain_error(StatusCode::NOT_FOUND, "File not found")
        }
        Err(StorageError::InvalidKey(_)) => {
            tracing::warn!(key = %asset.storage_key, "Stored path escapes upload root");
            return plain_error(StatusCode::FORBIDDEN, "Forbidden");
        }
        Err(e) => {
            tracing::error!(error = %e, key = %asset.storage_key, "Failed to stat media file");
            return plain_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    let disposition = content_disposition(asset.title, asset.kind.extension());

    match range_header {
        None => {
            let stream = match storage.read_stream(asset.storage_key).await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!(error = %e, key = %asset.storage_key, "Failed to open media file");
                    return plain_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
                }
            };
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, asset.kind.content_type())
                .header(header::CONTENT_LENGTH, meta.size)
                .header(header::ACCEPT_RANGES, "bytes")
                .header(header::CONTENT_DISPOSITION, disposition)
                .header(header::CACHE_CONTROL, "private, max-age=3600")
                .body(Body::from_stream(stream))
                .unwrap_or_else(|e| {
                    tracing::error!(error = %e, "Failed to build media response");
                    plain_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                })
        }
        Some(raw) => {
            let range = match parse_range(raw, meta.size) {
                Ok(range) => range,
                Err(_) => {
                    return Response::builder()
                        .status(StatusCode::RANGE_NOT_SATISFIABLE)
                        .header(header::CONTENT_RANGE, format!("bytes */{}", meta.size))
                        .body(Body::empty())
                        .expect("static 416 response");
                }
            };

            let stream = match storage
                .read_range(asset.storage_key, range.start, range.end)
                .await
            {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!(error = %e, key = %asset.storage_key, "Failed to open media file range");
                    return plain_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
                }
            };

            Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, asset.kind.content_type())
                .header(header::CONTENT_LENGTH, range.len())
                .header(header::ACCEPT_RANGES, "bytes")
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", range.start, range.end, meta.size),
                )
                .header(header::CONTENT_DISPOSITION, disposition)
                .header(header::CACHE_CONTROL, "private, max-age=3600")
                .body(Body::from_stream(stream))
                .unwrap_or_else(|e| {
                    tracing::error!(error = %e, "Failed to build media response");
                    plain_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn books_count_only_whole_file_requests() {
        assert!(should_count(MediaKind::BookPdf, None));
        assert!(!should_count(MediaKind::BookPdf, Some("bytes=0-")));
        assert!(!should_count(MediaKind::BookPdf, Some("bytes=100-200")));
    }

    #[test]
    fn videos_count_only_the_initial_probe() {
        assert!(should_count(MediaKind::VideoMp4, Some("bytes=0-")));
        assert!(!should_count(MediaKind::VideoMp4, None));
        assert!(!should_count(MediaKind::VideoMp4, Some("bytes=0-1023")));
        assert!(!should_count(MediaKind::VideoMp4, Some("bytes=1024-")));
    }

    #[test]
    fn disposition_urlencodes_the_title() {
        let value = content_disposition("صحيح البخاري vol 1", "pdf");
        assert!(value.starts_with("inline; filename=\""));
        assert!(value.ends_with(".pdf\""));
        assert!(!value.contains(' ') || value.contains("%20"));
        // No raw quotes from the title can break the header.
        assert_eq!(value.matches('"').count(), 2);
    }
}
