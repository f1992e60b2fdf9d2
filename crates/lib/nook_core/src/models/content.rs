//! Document-store models: posts and stories.
//!
//! The schema-flexible part of each entity lives in a `JSONB` document column;
//! only keys used for lookup and ordering are promoted to real columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifetime of a story before it stops being listed.
pub const STORY_LIFETIME_HOURS: i64 = 24;

/// Default on-screen duration of a story item, in seconds.
pub const STORY_ITEM_DURATION_SECS: i32 = 5;

/// Post document body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDoc {
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub video_urls: Vec<String>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub comments_count: i64,
}

/// A post as stored in the document database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub user_id: i64,
    #[sqlx(json)]
    #[serde(flatten)]
    pub doc: PostDoc,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Media kind of a story item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// One image or video inside a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    pub duration: i32,
    pub created_at: DateTime<Utc>,
}

/// A story as stored in the document database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Story {
    pub id: Uuid,
    pub user_id: i64,
    #[sqlx(json)]
    pub items: Vec<StoryItem>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_doc_flattens_into_post_json() {
        let now = Utc::now();
        let post = Post {
            id: Uuid::now_v7(),
            user_id: 3,
            doc: PostDoc {
                content: "hello".into(),
                image_urls: vec!["https://img.example/a.png".into()],
                ..PostDoc::default()
            },
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["content"], "hello");
        assert_eq!(json["likes_count"], 0);
        assert!(json.get("video_urls").is_none());
        assert!(json.get("doc").is_none());
    }

    #[test]
    fn media_kind_parses_known_values_only() {
        assert_eq!(MediaKind::parse("image"), Some(MediaKind::Image));
        assert_eq!(MediaKind::parse("video"), Some(MediaKind::Video));
        assert_eq!(MediaKind::parse("gif"), None);
    }
}
