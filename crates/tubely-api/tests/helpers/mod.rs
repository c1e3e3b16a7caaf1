//! Test helpers: build the real router on top of in-memory fakes.
//!
//! Run from workspace root: `cargo test -p tubely-api`. No database, object store or
//! ffmpeg is needed.

#![allow(dead_code)]

use axum_test::TestServer;
use chrono::Duration;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tubely_api::auth::{JwtVerifier, TokenVerifier};
use tubely_api::constants;
use tubely_api::setup::{routes, services};
use tubely_core::models::Video;
use tubely_core::{BaseConfig, Config, LogFormat, VideoServiceConfig};
use tubely_processing::test_helpers::{
    sample_video, FakeProcessRunner, MockStorage, MockVideoRepository,
};
use tubely_processing::OrchestratorDeps;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";
pub const TEST_BUCKET: &str = "tubely-videos";

/// API path prefix for tests (e.g. `/api/videos`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

pub fn test_config(staging_dir: PathBuf, max_video_size_bytes: u64) -> Config {
    Config(Box::new(VideoServiceConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 1,
            db_timeout_seconds: 5,
            jwt_secret: TEST_JWT_SECRET.to_string(),
            jwt_issuer: "tubely-access".to_string(),
            environment: "test".to_string(),
            log_format: LogFormat::Pretty,
        },
        database_url: "postgres://localhost/tubely_test".to_string(),
        s3_bucket: TEST_BUCKET.to_string(),
        s3_region: Some("us-east-1".to_string()),
        s3_endpoint: None,
        aws_region: None,
        ffmpeg_path: "ffmpeg".to_string(),
        ffprobe_path: "ffprobe".to_string(),
        max_video_size_bytes,
        max_thumbnail_size_bytes: 1024,
        video_allowed_types: vec!["mp4".to_string(), "mkv".to_string()],
        upload_temp_dir: staging_dir,
    }))
}

/// Test application: server plus handles on every fake behind it.
pub struct TestApp {
    pub server: TestServer,
    pub repository: Arc<MockVideoRepository>,
    pub storage: Arc<MockStorage>,
    pub runner: Arc<FakeProcessRunner>,
    pub verifier: JwtVerifier,
    pub staging: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Signed bearer header value for `user_id`
    pub fn bearer(&self, user_id: Uuid) -> String {
        let token = self
            .verifier
            .issue(user_id, Duration::hours(1))
            .expect("Failed to sign test token");
        format!("Bearer {}", token)
    }

    /// Store a fresh record owned by `user_id`
    pub fn insert_video(&self, user_id: Uuid) -> Video {
        let video = sample_video(user_id);
        self.repository.insert(video.clone());
        video
    }

    pub fn staged_file_count(&self) -> usize {
        std::fs::read_dir(self.staging.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

/// Setup test app whose probe reports a 1920x1080 stream.
pub fn setup_test_app() -> TestApp {
    setup_test_app_with(FakeProcessRunner::with_dimensions(1920, 1080), 1024 * 1024)
}

pub fn setup_test_app_with(runner: FakeProcessRunner, max_video_size_bytes: u64) -> TestApp {
    let staging = TempDir::new().expect("Failed to create staging dir");
    let config = test_config(staging.path().to_path_buf(), max_video_size_bytes);

    let repository = Arc::new(MockVideoRepository::new());
    let storage = Arc::new(MockStorage::new());
    let runner = Arc::new(runner);
    let verifier = JwtVerifier::from_config(&config);

    let deps = OrchestratorDeps {
        repository: repository.clone(),
        storage: storage.clone(),
        runner: runner.clone(),
    };
    let token_verifier: Arc<dyn TokenVerifier> = Arc::new(verifier.clone());
    let state = services::build_state(&config, deps, token_verifier, None);

    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        repository,
        storage,
        runner,
        verifier,
        staging,
    }
}
