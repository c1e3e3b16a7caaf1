use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use tubely_core::models::{CreateVideoParams, Video};
use tubely_core::AppError;
use uuid::Uuid;

const VIDEO_COLUMNS: &str =
    "id, created_at, updated_at, title, description, user_id, thumbnail_url, video_url";

/// Video metadata record store
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn create_video(&self, params: CreateVideoParams) -> Result<Video, AppError>;

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError>;

    /// Point the record at a stored object. Other columns keep their current values.
    async fn set_video_url(
        &self,
        id: Uuid,
        video_url: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Video, AppError>;

    /// Replace only the record's thumbnail.
    async fn set_thumbnail_url(
        &self,
        id: Uuid,
        thumbnail_url: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Video, AppError>;

    /// Remove the record. Stored objects are left in place.
    async fn delete_video(&self, id: Uuid) -> Result<(), AppError>;

    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError>;
}

/// PostgreSQL-backed video repository
#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    #[tracing::instrument(skip(self, params), fields(db.table = "videos", db.operation = "insert", user_id = %params.user_id))]
    async fn create_video(&self, params: CreateVideoParams) -> Result<Video, AppError> {
        let now = Utc::now();
        let video = sqlx::query_as::<Postgres, Video>(&format!(
            r#"
            INSERT INTO videos (id, created_at, updated_at, title, description, user_id)
            VALUES ($1, $2, $2, $3, $4, $5)
            RETURNING {VIDEO_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(now)
        .bind(&params.title)
        .bind(&params.description)
        .bind(params.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(video)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<Postgres, Video>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    #[tracing::instrument(skip(self, video_url), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn set_video_url(
        &self,
        id: Uuid,
        video_url: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Video, AppError> {
        let updated = sqlx::query_as::<Postgres, Video>(&format!(
            r#"
            UPDATE videos
            SET video_url = $2, updated_at = $3
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(video_url)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))
    }

    #[tracing::instrument(skip(self, thumbnail_url), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn set_thumbnail_url(
        &self,
        id: Uuid,
        thumbnail_url: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Video, AppError> {
        let updated = sqlx::query_as::<Postgres, Video>(&format!(
            r#"
            UPDATE videos
            SET thumbnail_url = $2, updated_at = $3
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(thumbnail_url)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "delete", db.record_id = %id))]
    async fn delete_video(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Video {} not found", id)));
        }

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", user_id = %user_id))]
    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError> {
        let videos = sqlx::query_as::<Postgres, Video>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }
}
