pub mod thumbnail_upload;
pub mod video_meta;
pub mod video_upload;

use futures::stream;
use tubely_core::AppError;
use uuid::Uuid;

/// Parse the `{video_id}` path segment
pub(crate) fn parse_video_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|e| {
        tracing::debug!(video_id = %raw, error = %e, "Invalid video ID");
        AppError::BadRequest("Invalid video ID".to_string())
    })
}

/// Body type standing in for a form part that was never sent
pub(crate) type MissingPart = stream::Empty<Result<bytes::Bytes, AppError>>;
