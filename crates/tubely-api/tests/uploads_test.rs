//! Video and thumbnail upload integration tests.
//!
//! Run with: `cargo test -p tubely-api --test uploads_test`

mod helpers;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use helpers::{api_path, setup_test_app, setup_test_app_with, TestApp, TEST_BUCKET};
use tubely_core::models::Video;
use tubely_processing::test_helpers::FakeProcessRunner;
use uuid::Uuid;

const VIDEO_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42 original upload body";

fn video_form(mime_type: &str) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from_static(VIDEO_BYTES))
        .file_name("boots.mp4")
        .mime_type(mime_type);
    MultipartForm::new()
        .add_text("title", "ignored")
        .add_part("video", part)
}

async fn post_video(
    app: &TestApp,
    video_id: Uuid,
    user_id: Uuid,
    form: MultipartForm,
) -> axum_test::TestResponse {
    app.client()
        .post(&api_path(&format!("/video_upload/{}", video_id)))
        .add_header("Authorization", app.bearer(user_id))
        .multipart(form)
        .await
}

#[tokio::test]
async fn test_upload_video_end_to_end() {
    let app = setup_test_app();
    let user_id = Uuid::new_v4();
    let video = app.insert_video(user_id);

    let response = post_video(&app, video.id, user_id, video_form("video/mp4")).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let uploaded: Video = response.json();
    let reference = uploaded.video_url.expect("reference stored");
    let prefix = format!("{},landscape/", TEST_BUCKET);
    assert!(reference.starts_with(&prefix), "{}", reference);
    assert!(reference.ends_with(".mp4"));

    let puts = app.storage.puts();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].bucket, TEST_BUCKET);
    assert_eq!(puts[0].content_type, "video/mp4");
    assert_eq!(puts[0].data.as_ref(), FakeProcessRunner::FASTSTART_BYTES);
    assert_eq!(format!("{},{}", puts[0].bucket, puts[0].key), reference);

    assert_eq!(app.repository.update_calls(), 1);
    assert_eq!(
        app.repository.video(video.id).unwrap().video_url.as_deref(),
        Some(reference.as_str())
    );
    assert_eq!(app.staged_file_count(), 0);

    // Reading the record back yields a signed URL for the stored object
    let response = app
        .client()
        .get(&api_path(&format!("/videos/{}", video.id)))
        .add_header("Authorization", app.bearer(user_id))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let signed: Video = response.json();
    assert!(signed
        .video_url
        .unwrap()
        .starts_with(&format!("https://{}.s3.example.test/landscape/", TEST_BUCKET)));
}

#[tokio::test]
async fn test_upload_portrait_video_uses_portrait_prefix() {
    let app = setup_test_app_with(FakeProcessRunner::with_dimensions(1080, 1920), 1024 * 1024);
    let user_id = Uuid::new_v4();
    let video = app.insert_video(user_id);

    let response = post_video(&app, video.id, user_id, video_form("video/mp4")).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let puts = app.storage.puts();
    assert_eq!(puts.len(), 1);
    assert!(puts[0].key.starts_with("portrait/"));
}

#[tokio::test]
async fn test_upload_by_non_owner_is_forbidden() {
    let app = setup_test_app();
    let video = app.insert_video(Uuid::new_v4());

    let response = post_video(&app, video.id, Uuid::new_v4(), video_form("video/mp4")).await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "FORBIDDEN");
    assert!(app.storage.puts().is_empty());
    assert_eq!(app.repository.update_calls(), 0);
    assert_eq!(app.runner.call_count(), 0);
    assert_eq!(app.staged_file_count(), 0);
}

#[tokio::test]
async fn test_upload_rejections() {
    let app = setup_test_app();
    let user_id = Uuid::new_v4();
    let video = app.insert_video(user_id);

    let response = app
        .client()
        .post(&api_path("/video_upload/not-a-uuid"))
        .add_header("Authorization", app.bearer(user_id))
        .multipart(video_form("video/mp4"))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = post_video(&app, Uuid::new_v4(), user_id, video_form("video/mp4")).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let form = MultipartForm::new().add_text("title", "no video part");
    let response = post_video(&app, video.id, user_id, form).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = post_video(&app, video.id, user_id, video_form("text/plain")).await;
    assert_eq!(response.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    assert!(app.storage.puts().is_empty());
    assert_eq!(app.repository.update_calls(), 0);
    assert_eq!(app.runner.call_count(), 0);
}

#[tokio::test]
async fn test_upload_too_large_is_rejected() {
    let app = setup_test_app_with(FakeProcessRunner::with_dimensions(1920, 1080), 8);
    let user_id = Uuid::new_v4();
    let video = app.insert_video(user_id);

    let response = post_video(&app, video.id, user_id, video_form("video/mp4")).await;

    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert!(app.storage.puts().is_empty());
    assert_eq!(app.staged_file_count(), 0);
}

#[tokio::test]
async fn test_file_at_ceiling_with_exact_content_length_is_accepted() {
    let app = setup_test_app_with(FakeProcessRunner::with_dimensions(1920, 1080), 32);
    let user_id = Uuid::new_v4();
    let video = app.insert_video(user_id);

    let file = [7u8; 32];
    let mut body = Vec::new();
    body.extend_from_slice(
        b"--tubely-boundary\r\n\
          Content-Disposition: form-data; name=\"video\"; filename=\"boots.mp4\"\r\n\
          Content-Type: video/mp4\r\n\r\n",
    );
    body.extend_from_slice(&file);
    body.extend_from_slice(b"\r\n--tubely-boundary--\r\n");
    let content_length = body.len().to_string();

    let response = app
        .client()
        .post(&api_path(&format!("/video_upload/{}", video.id)))
        .add_header("Authorization", app.bearer(user_id))
        .add_header("Content-Length", content_length)
        .content_type("multipart/form-data; boundary=tubely-boundary")
        .bytes(bytes::Bytes::from(body))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let puts = app.storage.puts();
    assert_eq!(puts.len(), 1);
    assert!(app.repository.video(video.id).unwrap().video_url.is_some());
}

#[tokio::test]
async fn test_upload_without_streams_is_unprocessable() {
    let runner = FakeProcessRunner::with_probe_output(br#"{"streams": []}"#.to_vec());
    let app = setup_test_app_with(runner, 1024 * 1024);
    let user_id = Uuid::new_v4();
    let video = app.insert_video(user_id);

    let response = post_video(&app, video.id, user_id, video_form("video/mp4")).await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "NO_STREAM");
    assert!(app.storage.puts().is_empty());
    assert_eq!(app.repository.update_calls(), 0);
    assert_eq!(app.staged_file_count(), 0);
}

#[tokio::test]
async fn test_store_failure_leaves_record_untouched() {
    let app = setup_test_app();
    app.storage.set_fail_puts(true);
    let user_id = Uuid::new_v4();
    let video = app.insert_video(user_id);

    let response = post_video(&app, video.id, user_id, video_form("video/mp4")).await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "STORAGE_ERROR");
    assert_eq!(app.repository.update_calls(), 0);
    assert!(app.repository.video(video.id).unwrap().video_url.is_none());
    assert_eq!(app.staged_file_count(), 0);
}

#[tokio::test]
async fn test_upload_thumbnail_stores_data_uri() {
    let app = setup_test_app();
    let user_id = Uuid::new_v4();
    let video = app.insert_video(user_id);

    let part = Part::bytes(bytes::Bytes::from_static(b"abc"))
        .file_name("thumb.png")
        .mime_type("image/png");
    let response = app
        .client()
        .post(&api_path(&format!("/thumbnail_upload/{}", video.id)))
        .add_header("Authorization", app.bearer(user_id))
        .multipart(MultipartForm::new().add_part("thumbnail", part))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let updated: Video = response.json();
    assert_eq!(
        updated.thumbnail_url.as_deref(),
        Some("data:image/png;base64,YWJj")
    );
    assert!(app.storage.puts().is_empty());
}

#[tokio::test]
async fn test_upload_thumbnail_rejections() {
    let app = setup_test_app();
    let owner = Uuid::new_v4();
    let video = app.insert_video(owner);
    let path = api_path(&format!("/thumbnail_upload/{}", video.id));

    let image = || {
        Part::bytes(bytes::Bytes::from_static(b"abc"))
            .file_name("thumb.png")
            .mime_type("image/png")
    };

    let response = app
        .client()
        .post(&path)
        .add_header("Authorization", app.bearer(Uuid::new_v4()))
        .multipart(MultipartForm::new().add_part("thumbnail", image()))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let not_an_image = Part::bytes(bytes::Bytes::from_static(b"abc"))
        .file_name("thumb.txt")
        .mime_type("text/plain");
    let response = app
        .client()
        .post(&path)
        .add_header("Authorization", app.bearer(owner))
        .multipart(MultipartForm::new().add_part("thumbnail", not_an_image))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let too_large = Part::bytes(bytes::Bytes::from(vec![0u8; 2048]))
        .file_name("big.png")
        .mime_type("image/png");
    let response = app
        .client()
        .post(&path)
        .add_header("Authorization", app.bearer(owner))
        .multipart(MultipartForm::new().add_part("thumbnail", too_large))
        .await;
    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

    let response = app
        .client()
        .post(&path)
        .add_header("Authorization", app.bearer(owner))
        .multipart(MultipartForm::new().add_text("title", "no thumbnail"))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    assert_eq!(app.repository.update_calls(), 0);
}
