//! Service initialization and application state setup

use crate::auth::{JwtVerifier, TokenVerifier};
use crate::state::AppState;
use sqlx::PgPool;
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::PgVideoRepository;
use tubely_processing::{
    OrchestratorConfig, OrchestratorDeps, ThumbnailConfig, ThumbnailService, TokioProcessRunner,
    UploadOrchestrator, VideoSigner,
};
use tubely_storage::Storage;

/// Wire the production collaborators into the application state
pub fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
) -> Arc<AppState> {
    let deps = OrchestratorDeps {
        repository: Arc::new(PgVideoRepository::new(pool.clone())),
        storage,
        runner: Arc::new(TokioProcessRunner::new()),
    };
    let verifier: Arc<dyn TokenVerifier> = Arc::new(JwtVerifier::from_config(config));

    tracing::info!(
        bucket = %config.s3_bucket(),
        ffmpeg_path = %config.ffmpeg_path(),
        ffprobe_path = %config.ffprobe_path(),
        staging_dir = %config.upload_temp_dir().display(),
        "Services initialized"
    );

    build_state(config, deps, verifier, Some(pool))
}

/// Assemble [`AppState`] from explicit collaborators
pub fn build_state(
    config: &Config,
    deps: OrchestratorDeps,
    verifier: Arc<dyn TokenVerifier>,
    pool: Option<PgPool>,
) -> Arc<AppState> {
    let orchestrator =
        UploadOrchestrator::new(deps.clone(), OrchestratorConfig::from_config(config));
    let thumbnails = ThumbnailService::new(
        deps.repository.clone(),
        ThumbnailConfig::from_config(config),
    );
    let signer = VideoSigner::new(deps.storage.clone());

    Arc::new(AppState {
        repository: deps.repository,
        storage: deps.storage,
        orchestrator,
        thumbnails,
        signer,
        verifier,
        pool,
    })
}
