//! Thumbnails are stored inline on the record as base64 data URIs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::{Bytes, BytesMut};
use chrono::Utc;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tubely_core::models::Video;
use tubely_core::{AppError, AppResult, Config};
use tubely_db::VideoRepository;
use uuid::Uuid;

use crate::validator::parse_media_type;
use crate::video::VideoPart;

#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    pub max_size_bytes: u64,
}

impl ThumbnailConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_size_bytes: config.max_thumbnail_size_bytes(),
        }
    }
}

/// Build `data:<type>;base64,<payload>`
pub fn data_uri(media_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(data))
}

#[derive(Clone)]
pub struct ThumbnailService {
    repository: Arc<dyn VideoRepository>,
    config: ThumbnailConfig,
}

impl ThumbnailService {
    pub fn new(repository: Arc<dyn VideoRepository>, config: ThumbnailConfig) -> Self {
        Self { repository, config }
    }

    /// Replace the record's thumbnail with the uploaded image. Owner only.
    #[tracing::instrument(skip_all, fields(video_id = %video_id, user_id = %requester_id))]
    pub async fn upload_thumbnail<S, E>(
        &self,
        video_id: Uuid,
        requester_id: Uuid,
        part: Option<VideoPart<S>>,
    ) -> AppResult<Video>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Into<AppError>,
    {
        let video = self
            .repository
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video doesn't exist".to_string()))?;

        if !video.is_owned_by(requester_id) {
            return Err(AppError::Forbidden(
                "Not authorized to update this video".to_string(),
            ));
        }

        let part =
            part.ok_or_else(|| AppError::BadRequest("Unable to parse form file".to_string()))?;
        let media_type = parse_media_type(part.content_type.as_deref())?;
        if !media_type.starts_with("image/") {
            return Err(AppError::UnsupportedMediaType(format!(
                "Thumbnail must be an image, got {}",
                media_type
            )));
        }

        let data = self.read_limited(part.body).await?;
        if data.is_empty() {
            return Err(AppError::BadRequest("Thumbnail is empty".to_string()));
        }

        let video = self
            .repository
            .set_thumbnail_url(video.id, &data_uri(&media_type, &data), Utc::now())
            .await?;

        tracing::info!(
            media_type = %media_type,
            size_bytes = data.len(),
            "Thumbnail updated"
        );

        Ok(video)
    }

    async fn read_limited<S, E>(&self, mut body: S) -> AppResult<Bytes>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Into<AppError>,
    {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(Into::<AppError>::into)?;
            if (buffer.len() + chunk.len()) as u64 > self.config.max_size_bytes {
                return Err(AppError::PayloadTooLarge(format!(
                    "Thumbnail exceeds the maximum size of {} bytes",
                    self.config.max_size_bytes
                )));
            }
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{sample_video, MockVideoRepository};
    use futures::stream;

    fn part(
        content_type: &str,
        chunks: Vec<&'static [u8]>,
    ) -> Option<VideoPart<stream::Iter<std::vec::IntoIter<Result<Bytes, AppError>>>>> {
        Some(VideoPart {
            content_type: Some(content_type.to_string()),
            body: stream::iter(
                chunks
                    .into_iter()
                    .map(|c| Ok(Bytes::from_static(c)))
                    .collect::<Vec<_>>(),
            ),
        })
    }

    fn setup(max_size_bytes: u64) -> (ThumbnailService, Arc<MockVideoRepository>, Video) {
        let repository = Arc::new(MockVideoRepository::new());
        let video = sample_video(Uuid::new_v4());
        repository.insert(video.clone());
        let service = ThumbnailService::new(repository.clone(), ThumbnailConfig { max_size_bytes });
        (service, repository, video)
    }

    #[test]
    fn test_data_uri() {
        assert_eq!(data_uri("image/png", b"abc"), "data:image/png;base64,YWJj");
    }

    #[tokio::test]
    async fn test_thumbnail_stored_as_data_uri() {
        let (service, repository, video) = setup(1024);

        let updated = service
            .upload_thumbnail(video.id, video.user_id, part("image/png; q=1", vec![b"ab", b"c"]))
            .await
            .unwrap();

        assert_eq!(
            updated.thumbnail_url.as_deref(),
            Some("data:image/png;base64,YWJj")
        );
        assert_eq!(repository.update_calls(), 1);
        assert_eq!(
            repository.video(video.id).unwrap().thumbnail_url,
            updated.thumbnail_url
        );
    }

    #[tokio::test]
    async fn test_thumbnail_keeps_video_reference_set_meanwhile() {
        let (service, repository, video) = setup(1024);
        repository.edit_after_next_get(|stored| {
            stored.video_url = Some("tubely-videos,landscape/abc.mp4".to_string());
        });

        let updated = service
            .upload_thumbnail(video.id, video.user_id, part("image/png", vec![b"abc"]))
            .await
            .unwrap();

        assert_eq!(
            updated.video_url.as_deref(),
            Some("tubely-videos,landscape/abc.mp4")
        );
        assert!(updated.thumbnail_url.is_some());
    }

    #[tokio::test]
    async fn test_thumbnail_validation() {
        let (service, repository, video) = setup(4);

        let err = service
            .upload_thumbnail(Uuid::new_v4(), video.user_id, part("image/png", vec![b"a"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service
            .upload_thumbnail(video.id, Uuid::new_v4(), part("image/png", vec![b"a"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = service
            .upload_thumbnail(video.id, video.user_id, part("video/mp4", vec![b"a"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType(_)));

        let err = service
            .upload_thumbnail(video.id, video.user_id, part("image/png", vec![b"abc", b"de"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));

        assert_eq!(repository.update_calls(), 0);
    }
}
