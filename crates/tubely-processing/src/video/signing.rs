//! Expansion of stored video references into signed retrieval URLs

use std::sync::Arc;
use std::time::Duration;
use tubely_core::constants::{SIGNED_URL_TTL, VIDEO_REFERENCE_SEPARATOR};
use tubely_core::models::Video;
use tubely_core::{AppError, AppResult};
use tubely_storage::Storage;

/// Split `<bucket>,<key>` into its two non-empty parts.
pub fn parse_reference(reference: &str) -> AppResult<(&str, &str)> {
    let mut parts = reference.split(VIDEO_REFERENCE_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(bucket), Some(key), None) if !bucket.is_empty() && !key.is_empty() => {
            Ok((bucket, key))
        }
        _ => Err(AppError::InvalidReference(format!(
            "expected <bucket>{}<key>, got {:?}",
            VIDEO_REFERENCE_SEPARATOR, reference
        ))),
    }
}

/// Compose the stored reference for an object
pub fn format_reference(bucket: &str, key: &str) -> String {
    format!("{}{}{}", bucket, VIDEO_REFERENCE_SEPARATOR, key)
}

/// Replaces stored references with presigned GET URLs. Nothing is cached.
#[derive(Clone)]
pub struct VideoSigner {
    storage: Arc<dyn Storage>,
    ttl: Duration,
}

impl VideoSigner {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            ttl: SIGNED_URL_TTL,
        }
    }

    /// Sign one record. Records without a stored video are returned unchanged.
    pub async fn sign(&self, mut video: Video) -> AppResult<Video> {
        let Some(reference) = video.video_url.as_deref() else {
            return Ok(video);
        };

        let (bucket, key) = parse_reference(reference).inspect_err(|e| {
            tracing::error!(video_id = %video.id, error = %e, "Stored video reference is invalid");
        })?;

        let url = self
            .storage
            .presigned_get_url(bucket, key, self.ttl)
            .await
            .map_err(|e| {
                tracing::error!(
                    video_id = %video.id,
                    bucket = %bucket,
                    key = %key,
                    error = %e,
                    "Failed to generate presigned URL"
                );
                AppError::Signing(format!("Couldn't sign the video URL: {}", e))
            })?;

        tracing::debug!(video_id = %video.id, "Signed video URL");
        video.video_url = Some(url);
        Ok(video)
    }

    /// Sign every record, stopping at the first failure.
    pub async fn sign_all(&self, videos: Vec<Video>) -> AppResult<Vec<Video>> {
        let mut signed = Vec::with_capacity(videos.len());
        for video in videos {
            signed.push(self.sign(video).await?);
        }
        Ok(signed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{sample_video, MockStorage, PresignCall};
    use uuid::Uuid;

    fn stored_video(reference: &str) -> Video {
        let mut video = sample_video(Uuid::new_v4());
        video.video_url = Some(reference.to_string());
        video
    }

    #[test]
    fn test_parse_reference() {
        assert_eq!(
            parse_reference("tubely-videos,landscape/abc.mp4").unwrap(),
            ("tubely-videos", "landscape/abc.mp4")
        );
        for reference in ["", ",", "bucket", "bucket,", ",key", "a,b,c"] {
            assert!(
                matches!(parse_reference(reference), Err(AppError::InvalidReference(_))),
                "{:?}",
                reference
            );
        }
        assert_eq!(format_reference("b", "k"), "b,k");
    }

    #[tokio::test]
    async fn test_sign_replaces_reference() {
        let storage = Arc::new(MockStorage::new());
        let signer = VideoSigner::new(storage.clone());

        let signed = signer
            .sign(stored_video("tubely-videos,landscape/abc.mp4"))
            .await
            .unwrap();

        let url = signed.video_url.unwrap();
        assert!(url.starts_with("https://tubely-videos.s3.example.test/landscape/abc.mp4"));
        assert_eq!(
            storage.presigns(),
            vec![PresignCall {
                bucket: "tubely-videos".to_string(),
                key: "landscape/abc.mp4".to_string(),
                expires_in: Duration::from_secs(60),
            }]
        );
    }

    #[tokio::test]
    async fn test_invalid_reference_never_reaches_storage() {
        let storage = Arc::new(MockStorage::new());
        let signer = VideoSigner::new(storage.clone());

        for reference in ["", "no-separator", "a,b,c"] {
            let err = signer.sign(stored_video(reference)).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidReference(_)));
        }
        assert!(storage.presigns().is_empty());
    }

    #[tokio::test]
    async fn test_unuploaded_video_returned_unchanged() {
        let storage = Arc::new(MockStorage::new());
        let signer = VideoSigner::new(storage.clone());

        let video = sample_video(Uuid::new_v4());
        let signed = signer.sign(video.clone()).await.unwrap();
        assert_eq!(signed, video);
        assert!(storage.presigns().is_empty());
    }

    #[tokio::test]
    async fn test_signing_twice_presigns_twice() {
        let storage = Arc::new(MockStorage::new());
        let signer = VideoSigner::new(storage.clone());
        let video = stored_video("tubely-videos,portrait/xyz.mp4");

        let first = signer.sign(video.clone()).await.unwrap();
        let second = signer.sign(video).await.unwrap();

        assert_ne!(first.video_url, second.video_url);
        let presigns = storage.presigns();
        assert_eq!(presigns.len(), 2);
        assert_eq!(presigns[0], presigns[1]);
    }

    #[tokio::test]
    async fn test_presign_failure_is_signing_error() {
        let storage = Arc::new(MockStorage::new());
        storage.set_fail_presigns(true);
        let signer = VideoSigner::new(storage);

        let err = signer
            .sign(stored_video("tubely-videos,landscape/abc.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Signing(_)));
    }

    #[tokio::test]
    async fn test_sign_all_stops_at_first_error() {
        let storage = Arc::new(MockStorage::new());
        let signer = VideoSigner::new(storage.clone());

        let videos = vec![
            stored_video("tubely-videos,landscape/a.mp4"),
            stored_video("broken"),
            stored_video("tubely-videos,landscape/c.mp4"),
        ];
        let err = signer.sign_all(videos).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidReference(_)));
        assert_eq!(storage.presigns().len(), 1);

        let signed = signer
            .sign_all(vec![
                sample_video(Uuid::new_v4()),
                stored_video("tubely-videos,other/b.mp4"),
            ])
            .await
            .unwrap();
        assert_eq!(signed.len(), 2);
        assert!(signed[0].video_url.is_none());
    }
}
