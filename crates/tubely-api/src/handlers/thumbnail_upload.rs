use crate::auth::AuthenticatedUser;
use crate::error::{multipart_error, ErrorResponse, HttpAppError};
use crate::handlers::{parse_video_id, MissingPart};
use crate::state::AppState;
use axum::{
    extract::multipart::{Multipart, MultipartRejection},
    extract::{Path, State},
    Json,
};
use futures::StreamExt;
use std::sync::Arc;
use tubely_core::constants::THUMBNAIL_FORM_FIELD;
use tubely_core::models::Video;
use tubely_processing::VideoPart;

#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{video_id}",
    tag = "videos",
    params(
        ("video_id" = String, Path, description = "Video ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Form with a `thumbnail` image part"),
    responses(
        (status = 200, description = "Thumbnail stored inline as a data URI", body = Video),
        (status = 400, description = "Malformed ID, form or content type", body = ErrorResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "Thumbnail too large", body = ErrorResponse),
        (status = 415, description = "Thumbnail is not an image", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, multipart), fields(user_id = %user.user_id))]
pub async fn upload_thumbnail(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(video_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Video>, HttpAppError> {
    let video_id = parse_video_id(&video_id)?;
    let mut multipart = multipart?;

    let mut outcome = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(THUMBNAIL_FORM_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let body = std::pin::pin!(field.map(|chunk| chunk.map_err(multipart_error)));
        let part = VideoPart { content_type, body };
        outcome = Some(
            state
                .thumbnails
                .upload_thumbnail(video_id, user.user_id, Some(part))
                .await,
        );
        break;
    }

    let video = match outcome {
        Some(result) => result?,
        None => {
            state
                .thumbnails
                .upload_thumbnail(video_id, user.user_id, None::<VideoPart<MissingPart>>)
                .await?
        }
    };

    Ok(Json(video))
}
