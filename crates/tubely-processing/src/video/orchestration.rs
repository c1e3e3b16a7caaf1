//! Video upload orchestration: validate → stage → faststart → probe → store → update DB.

use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt};
use std::io::SeekFrom;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tubely_core::constants::MULTIPART_OVERHEAD_BYTES;
use tubely_core::models::Video;
use tubely_core::{AppError, AppResult, Config};
use tubely_db::VideoRepository;
use tubely_storage::{KeyDeriver, Storage};
use uuid::Uuid;

use super::faststart::FastStartRewriter;
use super::probe::AspectProbe;
use super::signing::format_reference;
use crate::process::ProcessRunner;
use crate::staging::{FastStartOutput, OriginalUpload, StagingArea, ORIGINAL_SUFFIX};
use crate::validator::MediaTypeClassifier;

/// The `video` part of an upload request
pub struct VideoPart<S> {
    pub content_type: Option<String>,
    pub body: S,
}

/// Collaborators of the orchestrator
#[derive(Clone)]
pub struct OrchestratorDeps {
    pub repository: Arc<dyn VideoRepository>,
    pub storage: Arc<dyn Storage>,
    pub runner: Arc<dyn ProcessRunner>,
}

/// Config for upload orchestration (bucket, limits, tools, staging).
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub bucket: String,
    pub max_video_size_bytes: u64,
    pub allowed_types: Vec<String>,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub staging_dir: PathBuf,
}

impl OrchestratorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bucket: config.s3_bucket().to_string(),
            max_video_size_bytes: config.max_video_size_bytes(),
            allowed_types: config.video_allowed_types().to_vec(),
            ffmpeg_path: config.ffmpeg_path().to_string(),
            ffprobe_path: config.ffprobe_path().to_string(),
            staging_dir: config.upload_temp_dir().to_path_buf(),
        }
    }
}

/// Runs one video upload from request body to updated record.
#[derive(Clone)]
pub struct UploadOrchestrator {
    repository: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
    classifier: MediaTypeClassifier,
    staging: StagingArea,
    rewriter: FastStartRewriter,
    probe: AspectProbe,
    keys: KeyDeriver,
    config: OrchestratorConfig,
}

impl UploadOrchestrator {
    pub fn new(deps: OrchestratorDeps, config: OrchestratorConfig) -> Self {
        let staging = StagingArea::new(config.staging_dir.clone());
        Self {
            repository: deps.repository,
            storage: deps.storage,
            classifier: MediaTypeClassifier::new(config.allowed_types.clone()),
            rewriter: FastStartRewriter::new(
                config.ffmpeg_path.clone(),
                deps.runner.clone(),
                staging.clone(),
            ),
            probe: AspectProbe::new(config.ffprobe_path.clone(), deps.runner),
            staging,
            keys: KeyDeriver::new(),
            config,
        }
    }

    /// Validate, process and store an uploaded video for `video_id`.
    ///
    /// Checks run in order: record exists, requester owns it, declared length fits, the
    /// `video` part and its content type are present, the type is supported. The returned
    /// record carries the raw `<bucket>,<key>` reference.
    ///
    /// `declared_len` is the whole request's length, multipart framing included, so it is
    /// only checked against the ceiling plus [`MULTIPART_OVERHEAD_BYTES`]. The exact ceiling
    /// applies to the streamed file body.
    #[tracing::instrument(skip_all, fields(video_id = %video_id, user_id = %requester_id, declared_len = ?declared_len))]
    pub async fn upload_video<S, E>(
        &self,
        video_id: Uuid,
        requester_id: Uuid,
        declared_len: Option<u64>,
        part: Option<VideoPart<S>>,
    ) -> AppResult<Video>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Into<AppError>,
    {
        let start = std::time::Instant::now();

        let video = self
            .repository
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Couldn't find video".to_string()))?;

        if !video.is_owned_by(requester_id) {
            tracing::warn!(owner_id = %video.user_id, "Upload attempted by non-owner");
            return Err(AppError::Forbidden(
                "Not authorized to upload the video".to_string(),
            ));
        }

        if let Some(len) = declared_len {
            if len > self.max_declared_len() {
                return Err(self.too_large());
            }
        }

        let part = part
            .ok_or_else(|| AppError::BadRequest("Couldn't find attached file".to_string()))?;
        let media_type = self
            .classifier
            .parse_media_type(part.content_type.as_deref())?;
        if !self.classifier.is_supported(&media_type) {
            return Err(AppError::UnsupportedMediaType(format!(
                "Unsupported video file format: {}",
                media_type
            )));
        }

        let original = self.stage(part.body).await?;
        let output = self.rewriter.rewrite(&original).await?;
        let aspect = self.probe.probe(&original).await?;
        drop(original);

        let key = self.keys.object_key(aspect, &media_type);
        self.store(output, &key, &media_type).await?;

        let reference = format_reference(&self.config.bucket, &key);
        let video = self
            .repository
            .set_video_url(video.id, &reference, Utc::now())
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.config.bucket,
                    key = %key,
                    "Record update failed after upload; stored object is orphaned"
                );
                match e {
                    AppError::Persistence(_) => e,
                    other => AppError::Persistence(other.to_string()),
                }
            })?;

        tracing::info!(
            aspect = %aspect,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video upload complete"
        );

        Ok(video)
    }

    fn max_declared_len(&self) -> u64 {
        self.config
            .max_video_size_bytes
            .saturating_add(MULTIPART_OVERHEAD_BYTES)
    }

    fn too_large(&self) -> AppError {
        AppError::PayloadTooLarge(format!(
            "Video exceeds the maximum size of {} bytes",
            self.config.max_video_size_bytes
        ))
    }

    /// Stream the body into a staged file, enforcing the size ceiling as bytes arrive.
    async fn stage<S, E>(&self, mut body: S) -> AppResult<OriginalUpload>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Into<AppError>,
    {
        let (mut file, staged) = self.staging.create(ORIGINAL_SUFFIX)?;
        let original = OriginalUpload::new(staged);

        let mut written: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(Into::<AppError>::into)?;
            written += chunk.len() as u64;
            if written > self.config.max_video_size_bytes {
                tracing::warn!(
                    size_bytes = written,
                    max_bytes = self.config.max_video_size_bytes,
                    "Upload aborted at size ceiling"
                );
                return Err(self.too_large());
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        file.seek(SeekFrom::Start(0)).await?;

        tracing::debug!(size_bytes = written, "Upload staged");
        Ok(original)
    }

    async fn store(&self, output: FastStartOutput, key: &str, media_type: &str) -> AppResult<()> {
        let data = Bytes::from(tokio::fs::read(output.path()).await?);
        drop(output);

        self.storage
            .put_object(&self.config.bucket, key, data, media_type)
            .await
            .map_err(|e| AppError::Storage(format!("Couldn't store video: {}", e)))
    }
}
