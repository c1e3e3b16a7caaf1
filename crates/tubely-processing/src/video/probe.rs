//! Aspect ratio detection with ffprobe

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tubely_core::models::AspectRatio;

use crate::error::ProcessingError;
use crate::process::ProcessRunner;
use crate::staging::OriginalUpload;

const LANDSCAPE: f64 = 16.0 / 9.0;
const PORTRAIT: f64 = 9.0 / 16.0;
const TOLERANCE: f64 = 0.1;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Width and height of the first stream that has both
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
}

/// Classify a width/height pair. Computed in floating point; zero height is `Other`.
pub fn classify(width: u32, height: u32) -> AspectRatio {
    if height == 0 {
        return AspectRatio::Other;
    }
    classify_ratio(width as f64 / height as f64)
}

pub fn classify_ratio(ratio: f64) -> AspectRatio {
    if (ratio - LANDSCAPE).abs() < TOLERANCE {
        AspectRatio::Landscape
    } else if (ratio - PORTRAIT).abs() < TOLERANCE {
        AspectRatio::Portrait
    } else {
        AspectRatio::Other
    }
}

/// Decode ffprobe `-show_streams` JSON into the first stream carrying dimensions
pub fn parse_probe_output(stdout: &[u8]) -> Result<StreamInfo, ProcessingError> {
    let output: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| ProcessingError::ProbeParse(e.to_string()))?;

    if output.streams.is_empty() {
        return Err(ProcessingError::NoStream);
    }

    output
        .streams
        .iter()
        .find_map(|s| match (s.width, s.height) {
            (Some(width), Some(height)) => Some(StreamInfo { width, height }),
            _ => None,
        })
        .ok_or_else(|| ProcessingError::ProbeParse("no stream carries dimensions".to_string()))
}

/// Reads stream geometry of a staged upload through ffprobe.
#[derive(Clone)]
pub struct AspectProbe {
    ffprobe_path: String,
    runner: Arc<dyn ProcessRunner>,
}

impl AspectProbe {
    pub fn new(ffprobe_path: String, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            ffprobe_path,
            runner,
        }
    }

    /// Probe the upload as received.
    pub async fn probe(&self, upload: &OriginalUpload) -> Result<AspectRatio, ProcessingError> {
        self.probe_path(upload.path()).await
    }

    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    pub async fn probe_path(&self, path: &Path) -> Result<AspectRatio, ProcessingError> {
        let start = std::time::Instant::now();
        let args = vec![
            "-v".to_string(),
            "error".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_streams".to_string(),
            path.to_string_lossy().to_string(),
        ];

        let output = self
            .runner
            .run(&self.ffprobe_path, &args)
            .await
            .map_err(|e| ProcessingError::ProbeExecution(format!("Failed to execute ffprobe: {}", e)))?;

        if !output.status_success {
            return Err(ProcessingError::ProbeExecution(format!(
                "ffprobe exited with {:?}: {}",
                output.code,
                output.stderr_lossy()
            )));
        }

        let stream = parse_probe_output(&output.stdout)?;
        let aspect = classify(stream.width, stream.height);

        tracing::info!(
            width = stream.width,
            height = stream.height,
            aspect = %aspect,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video probed"
        );

        Ok(aspect)
    }
}
