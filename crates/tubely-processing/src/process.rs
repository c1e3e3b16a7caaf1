//! External process execution.
//!
//! The media tools run through [`ProcessRunner`] so the pipeline can be exercised without
//! ffmpeg installed.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Captured result of a finished process
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub status_success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args` to completion. `Err` means the process could not be started.
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<ProcessOutput>;
}

/// Reject program paths carrying shell metacharacters or traversal
pub fn validate_program_path(path: &str) -> Result<(), String> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty() {
        return Err("Program path is empty".to_string());
    }
    if path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(format!("Program path contains dangerous characters: {}", path));
    }
    if path.contains("..") {
        return Err(format!("Program path contains directory traversal: {}", path));
    }
    Ok(())
}

/// Runs processes with `tokio::process::Command`, awaiting their exit.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        TokioProcessRunner
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    #[tracing::instrument(skip(self, args), fields(process.executable.name = %program))]
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<ProcessOutput> {
        validate_program_path(program)
            .map_err(|msg| std::io::Error::new(std::io::ErrorKind::InvalidInput, msg))?;

        let start = std::time::Instant::now();
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        tracing::debug!(
            code = ?output.status.code(),
            success = output.status.success(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Process finished"
        );

        Ok(ProcessOutput {
            status_success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_program_path() {
        assert!(validate_program_path("ffprobe").is_ok());
        assert!(validate_program_path("/usr/local/bin/ffmpeg").is_ok());
        assert!(validate_program_path("").is_err());
        assert!(validate_program_path("ffmpeg; rm -rf /").is_err());
        assert!(validate_program_path("../bin/ffmpeg").is_err());
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let runner = TokioProcessRunner::new();
        let result = runner
            .run("tubely-definitely-not-installed", &["-version".to_string()])
            .await;
        assert!(result.is_err());
    }
}
