//! Faststart rewrite: moves the MP4 index to the front of the file for progressive playback.

use std::sync::Arc;

use crate::error::ProcessingError;
use crate::process::ProcessRunner;
use crate::staging::{FastStartOutput, OriginalUpload, StagingArea, PROCESSING_SUFFIX};

#[derive(Clone)]
pub struct FastStartRewriter {
    ffmpeg_path: String,
    runner: Arc<dyn ProcessRunner>,
    staging: StagingArea,
}

impl FastStartRewriter {
    pub fn new(ffmpeg_path: String, runner: Arc<dyn ProcessRunner>, staging: StagingArea) -> Self {
        Self {
            ffmpeg_path,
            runner,
            staging,
        }
    }

    /// Stream-copy `input` into a new staged file with `-movflags faststart`.
    ///
    /// The input is only read. The output is removed again if ffmpeg fails.
    #[tracing::instrument(skip(self, input), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart",
        input = %input.path().display()
    ))]
    pub async fn rewrite(&self, input: &OriginalUpload) -> Result<FastStartOutput, ProcessingError> {
        let start = std::time::Instant::now();
        let (file, output) = self.staging.create(PROCESSING_SUFFIX)?;
        // ffmpeg writes by path
        drop(file);

        let args = vec![
            "-y".to_string(),
            "-i".to_string(),
            input.path().to_string_lossy().to_string(),
            "-c".to_string(),
            "copy".to_string(),
            "-movflags".to_string(),
            "faststart".to_string(),
            "-f".to_string(),
            "mp4".to_string(),
            output.path().to_string_lossy().to_string(),
        ];

        let result = self
            .runner
            .run(&self.ffmpeg_path, &args)
            .await
            .map_err(|e| ProcessingError::RewriteExecution(format!("Failed to execute ffmpeg: {}", e)))?;

        if !result.status_success {
            return Err(ProcessingError::RewriteExecution(format!(
                "ffmpeg exited with {:?}: {}",
                result.code,
                result.stderr_lossy()
            )));
        }

        tracing::info!(
            output = %output.path().display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Faststart rewrite complete"
        );

        Ok(FastStartOutput::new(output))
    }
}
