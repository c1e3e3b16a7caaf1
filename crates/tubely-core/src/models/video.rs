use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

/// A video metadata record.
///
/// `video_url` holds the storage reference `<bucket>,<objectKey>` once a video has been
/// uploaded. Responses replace it with a short-lived signed URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Video {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub user_id: Uuid,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
}

impl Video {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Parameters for creating a record. `user_id` is always the authenticated caller.
#[derive(Debug, Clone)]
pub struct CreateVideoParams {
    pub title: String,
    pub description: String,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl CreateVideoRequest {
    pub fn into_params(self, user_id: Uuid) -> CreateVideoParams {
        CreateVideoParams {
            title: self.title,
            description: self.description,
            user_id,
        }
    }
}

/// Coarse geometry of a video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "other")]
    Other,
}

impl AspectRatio {
    /// Object key prefix for videos of this geometry
    pub fn key_prefix(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "landscape",
            AspectRatio::Portrait => "portrait",
            AspectRatio::Other => "other",
        }
    }
}

impl Display for AspectRatio {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AspectRatio::Landscape => write!(f, "16:9"),
            AspectRatio::Portrait => write!(f, "9:16"),
            AspectRatio::Other => write!(f, "other"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_prefixes() {
        assert_eq!(AspectRatio::Landscape.key_prefix(), "landscape");
        assert_eq!(AspectRatio::Portrait.key_prefix(), "portrait");
        assert_eq!(AspectRatio::Other.key_prefix(), "other");
        assert_eq!(AspectRatio::Portrait.to_string(), "9:16");
    }

    #[test]
    fn test_create_request_uses_caller_id() {
        let caller = Uuid::new_v4();
        let request: CreateVideoRequest =
            serde_json::from_str(r#"{"title":"Boots","description":"A pair of boots"}"#)
                .unwrap();
        let params = request.into_params(caller);
        assert_eq!(params.user_id, caller);
        assert_eq!(params.title, "Boots");
    }
}
