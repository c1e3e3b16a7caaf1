use crate::auth::AuthenticatedUser;
use crate::error::{multipart_error, ErrorResponse, HttpAppError};
use crate::handlers::{parse_video_id, MissingPart};
use crate::state::AppState;
use axum::{
    extract::multipart::{Multipart, MultipartRejection},
    extract::{Path, State},
    http::{header::CONTENT_LENGTH, HeaderMap},
    Json,
};
use futures::StreamExt;
use std::sync::Arc;
use tubely_core::constants::VIDEO_FORM_FIELD;
use tubely_core::models::Video;
use tubely_processing::VideoPart;

#[utoipa::path(
    post,
    path = "/api/video_upload/{video_id}",
    tag = "videos",
    params(
        ("video_id" = String, Path, description = "Video ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Form with a `video` file part"),
    responses(
        (status = 200, description = "Video stored; `video_url` holds the storage reference", body = Video),
        (status = 400, description = "Malformed ID, form or content type", body = ErrorResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "Video too large", body = ErrorResponse),
        (status = 415, description = "Unsupported video type", body = ErrorResponse),
        (status = 422, description = "File contains no streams", body = ErrorResponse),
        (status = 500, description = "Processing, storage or database failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, headers, multipart), fields(user_id = %user.user_id))]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(video_id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Video>, HttpAppError> {
    let video_id = parse_video_id(&video_id)?;
    let declared_len = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    let mut multipart = multipart?;

    let mut outcome = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(VIDEO_FORM_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let body = std::pin::pin!(field.map(|chunk| chunk.map_err(multipart_error)));
        let part = VideoPart { content_type, body };
        outcome = Some(
            state
                .orchestrator
                .upload_video(video_id, user.user_id, declared_len, Some(part))
                .await,
        );
        break;
    }

    let video = match outcome {
        Some(result) => result?,
        None => {
            state
                .orchestrator
                .upload_video(video_id, user.user_id, declared_len, None::<VideoPart<MissingPart>>)
                .await?
        }
    };

    tracing::info!(video_id = %video.id, "Video upload complete");
    Ok(Json(video))
}
