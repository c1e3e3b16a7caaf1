//! Video upload pipeline

pub mod faststart;
pub mod orchestration;
pub mod probe;
pub mod signing;

pub use faststart::FastStartRewriter;
pub use orchestration::{OrchestratorConfig, OrchestratorDeps, UploadOrchestrator, VideoPart};
pub use probe::AspectProbe;
pub use signing::VideoSigner;
