//! Tubely media processing
//!
//! The video ingestion pipeline: media type classification, upload staging, aspect ratio
//! probing and faststart rewriting through external ffmpeg binaries, upload orchestration
//! and signed URL generation for stored videos. Thumbnails are kept inline as data URIs.

pub mod error;
pub mod process;
pub mod staging;
pub mod thumbnail;
pub mod validator;
pub mod video;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use error::ProcessingError;
pub use process::{ProcessOutput, ProcessRunner, TokioProcessRunner};
pub use staging::{StagedFile, StagingArea};
pub use thumbnail::{ThumbnailConfig, ThumbnailService};
pub use validator::MediaTypeClassifier;
pub use video::{
    AspectProbe, FastStartRewriter, OrchestratorConfig, OrchestratorDeps, UploadOrchestrator,
    VideoPart, VideoSigner,
};
