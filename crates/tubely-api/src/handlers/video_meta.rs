use crate::auth::AuthenticatedUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::parse_video_id;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tubely_core::models::{CreateVideoRequest, Video};
use tubely_core::AppError;

#[utoipa::path(
    post,
    path = "/api/videos",
    tag = "videos",
    request_body = CreateVideoRequest,
    responses(
        (status = 201, description = "Video record created", body = Video),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, request), fields(user_id = %user.user_id))]
pub async fn create_video(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateVideoRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title must not be empty".to_string()).into());
    }

    let video = state
        .repository
        .create_video(request.into_params(user.user_id))
        .await?;

    tracing::info!(video_id = %video.id, "Video record created");
    Ok((StatusCode::CREATED, Json(video)))
}

#[utoipa::path(
    get,
    path = "/api/videos",
    tag = "videos",
    responses(
        (status = 200, description = "Caller's videos, newest first, with signed URLs", body = Vec<Video>),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 500, description = "Signing or database failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Video>>, HttpAppError> {
    let videos = state.repository.list_videos_for_user(user.user_id).await?;
    let videos = state.signer.sign_all(videos).await?;

    tracing::debug!(count = videos.len(), "Listed videos");
    Ok(Json(videos))
}

#[utoipa::path(
    get,
    path = "/api/videos/{video_id}",
    tag = "videos",
    params(
        ("video_id" = String, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video with a signed URL", body = Video),
        (status = 400, description = "Malformed video ID", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Signing failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(video_id): Path<String>,
) -> Result<Json<Video>, HttpAppError> {
    let video_id = parse_video_id(&video_id)?;
    let video = state
        .repository
        .get_video(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Couldn't get video".to_string()))?;

    Ok(Json(state.signer.sign(video).await?))
}

#[utoipa::path(
    delete,
    path = "/api/videos/{video_id}",
    tag = "videos",
    params(
        ("video_id" = String, Path, description = "Video ID")
    ),
    responses(
        (status = 204, description = "Video deleted"),
        (status = 400, description = "Malformed video ID", body = ErrorResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn delete_video(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(video_id): Path<String>,
) -> Result<StatusCode, HttpAppError> {
    let video_id = parse_video_id(&video_id)?;
    let video = state
        .repository
        .get_video(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Couldn't get video".to_string()))?;

    if !video.is_owned_by(user.user_id) {
        tracing::warn!(video_id = %video_id, owner_id = %video.user_id, "Delete attempted by non-owner");
        return Err(AppError::Forbidden("You can't delete this video".to_string()).into());
    }

    state.repository.delete_video(video_id).await?;

    tracing::info!(video_id = %video_id, "Video deleted");
    Ok(StatusCode::NO_CONTENT)
}
