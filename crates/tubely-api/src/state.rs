//! Shared application state handed to every handler.

use sqlx::PgPool;
use std::sync::Arc;
use tubely_db::VideoRepository;
use tubely_processing::{ThumbnailService, UploadOrchestrator, VideoSigner};
use tubely_storage::Storage;

use crate::auth::TokenVerifier;

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn VideoRepository>,
    pub storage: Arc<dyn Storage>,
    pub orchestrator: UploadOrchestrator,
    pub thumbnails: ThumbnailService,
    pub signer: VideoSigner,
    pub verifier: Arc<dyn TokenVerifier>,
    /// Present when backed by PostgreSQL; readiness pings it
    pub pool: Option<PgPool>,
}
