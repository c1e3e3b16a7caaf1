use tubely_core::AppError;

/// Failures of the external media tools and the staging area
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("ffprobe could not be run: {0}")]
    ProbeExecution(String),

    #[error("ffprobe output could not be parsed: {0}")]
    ProbeParse(String),

    #[error("ffprobe reported no streams")]
    NoStream,

    #[error("ffmpeg faststart rewrite failed: {0}")]
    RewriteExecution(String),

    #[error("Staging error: {0}")]
    Staging(#[from] std::io::Error),
}

impl From<ProcessingError> for AppError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::ProbeExecution(msg) => AppError::ProbeExecution(msg),
            ProcessingError::ProbeParse(msg) => AppError::ProbeParse(msg),
            ProcessingError::NoStream => {
                AppError::NoStream("The uploaded file contains no streams".to_string())
            }
            ProcessingError::RewriteExecution(msg) => AppError::RewriteExecution(msg),
            ProcessingError::Staging(e) => AppError::Internal(format!("Staging failed: {}", e)),
        }
    }
}
