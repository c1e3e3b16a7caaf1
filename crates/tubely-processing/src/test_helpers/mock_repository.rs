use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tubely_core::models::{CreateVideoParams, Video};
use tubely_core::AppError;
use tubely_db::VideoRepository;
use uuid::Uuid;

/// A record owned by `user_id` with no uploads yet
pub fn sample_video(user_id: Uuid) -> Video {
    let now = Utc::now();
    Video {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        title: "Boots".to_string(),
        description: "A pair of boots".to_string(),
        user_id,
        thumbnail_url: None,
        video_url: None,
    }
}

/// In-memory [`VideoRepository`] with call counters and failure injection
#[derive(Default)]
pub struct MockVideoRepository {
    videos: Mutex<HashMap<Uuid, Video>>,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fail_updates: AtomicBool,
    edit_after_get: Mutex<Option<EditHook>>,
}

type EditHook = Box<dyn Fn(&mut Video) + Send + Sync>;

impl MockVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, video: Video) {
        if let Ok(mut videos) = self.videos.lock() {
            videos.insert(video.id, video);
        }
    }

    pub fn video(&self, id: Uuid) -> Option<Video> {
        self.videos.lock().ok().and_then(|v| v.get(&id).cloned())
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Apply `edit` to the stored row right after the next `get_video` hands out its
    /// snapshot, as another request committing in between would.
    pub fn edit_after_next_get(&self, edit: impl Fn(&mut Video) + Send + Sync + 'static) {
        if let Ok(mut hook) = self.edit_after_get.lock() {
            *hook = Some(Box::new(edit));
        }
    }

    fn apply_update(
        &self,
        id: Uuid,
        updated_at: DateTime<Utc>,
        change: impl FnOnce(&mut Video),
    ) -> Result<Video, AppError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("connection reset".to_string()));
        }
        let mut videos = self.lock()?;
        let video = videos
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;
        change(video);
        video.updated_at = updated_at;
        Ok(video.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, Video>>, AppError> {
        self.videos
            .lock()
            .map_err(|_| AppError::Persistence("mock repository poisoned".to_string()))
    }
}

#[async_trait]
impl VideoRepository for MockVideoRepository {
    async fn create_video(&self, params: CreateVideoParams) -> Result<Video, AppError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut video = sample_video(params.user_id);
        video.title = params.title;
        video.description = params.description;
        self.lock()?.insert(video.id, video.clone());
        Ok(video)
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        let mut videos = self.lock()?;
        let snapshot = videos.get(&id).cloned();
        let hook = self.edit_after_get.lock().ok().and_then(|mut h| h.take());
        if let (Some(edit), Some(stored)) = (hook, videos.get_mut(&id)) {
            edit(stored);
        }
        Ok(snapshot)
    }

    async fn set_video_url(
        &self,
        id: Uuid,
        video_url: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Video, AppError> {
        self.apply_update(id, updated_at, |video| {
            video.video_url = Some(video_url.to_string())
        })
    }

    async fn set_thumbnail_url(
        &self,
        id: Uuid,
        thumbnail_url: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Video, AppError> {
        self.apply_update(id, updated_at, |video| {
            video.thumbnail_url = Some(thumbnail_url.to_string())
        })
    }

    async fn delete_video(&self, id: Uuid) -> Result<(), AppError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.lock()?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))
    }

    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError> {
        let mut videos: Vec<Video> = self
            .lock()?
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }
}
