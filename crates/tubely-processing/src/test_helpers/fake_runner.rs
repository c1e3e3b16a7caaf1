use async_trait::async_trait;
use std::sync::Mutex;

use crate::process::{ProcessOutput, ProcessRunner};

/// One recorded invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCall {
    pub program: String,
    pub args: Vec<String>,
}

/// Stands in for ffprobe and ffmpeg.
///
/// Programs ending in `ffprobe` print the configured JSON. Anything else is treated as
/// ffmpeg and writes [`FakeProcessRunner::FASTSTART_BYTES`] to its last argument.
pub struct FakeProcessRunner {
    probe_stdout: Vec<u8>,
    probe_fails: bool,
    rewrite_fails: bool,
    unspawnable: bool,
    calls: Mutex<Vec<ProcessCall>>,
}

impl FakeProcessRunner {
    pub const FASTSTART_BYTES: &'static [u8] = b"faststart mp4 payload";

    pub fn with_probe_output(probe_stdout: Vec<u8>) -> Self {
        Self {
            probe_stdout,
            probe_fails: false,
            rewrite_fails: false,
            unspawnable: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// One audio stream without dimensions followed by a video stream
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        let stdout = serde_json::json!({
            "streams": [
                { "index": 0, "codec_type": "audio", "codec_name": "aac" },
                { "index": 1, "codec_type": "video", "codec_name": "h264", "width": width, "height": height }
            ]
        });
        Self::with_probe_output(stdout.to_string().into_bytes())
    }

    /// Every program fails to start
    pub fn unspawnable() -> Self {
        Self {
            unspawnable: true,
            ..Self::with_probe_output(Vec::new())
        }
    }

    pub fn failing_probe(mut self) -> Self {
        self.probe_fails = true;
        self
    }

    pub fn failing_rewrite(mut self) -> Self {
        self.rewrite_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<ProcessCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    fn failed(stderr: &str) -> ProcessOutput {
        ProcessOutput {
            status_success: false,
            code: Some(1),
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }
}

#[async_trait]
impl ProcessRunner for FakeProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<ProcessOutput> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(ProcessCall {
                program: program.to_string(),
                args: args.to_vec(),
            });
        }

        if self.unspawnable {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{}: not found", program),
            ));
        }

        if program.ends_with("ffprobe") {
            if self.probe_fails {
                return Ok(Self::failed("Invalid data found when processing input"));
            }
            return Ok(ProcessOutput {
                status_success: true,
                code: Some(0),
                stdout: self.probe_stdout.clone(),
                stderr: Vec::new(),
            });
        }

        if self.rewrite_fails {
            return Ok(Self::failed("moov atom not found"));
        }
        if let Some(output) = args.last() {
            tokio::fs::write(output, Self::FASTSTART_BYTES).await?;
        }
        Ok(ProcessOutput {
            status_success: true,
            code: Some(0),
            stdout: Vec::new(),
            stderr: Vec::new(),
        })
    }
}
