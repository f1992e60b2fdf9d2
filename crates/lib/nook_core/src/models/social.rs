//! Relational-store models: comments, follows, friend requests,
//! notifications, saved posts and story reactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Comment on a post.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: Uuid,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Friend request lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FriendRequestStatus {
    /// Database text representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendRequestStatus::Pending => "pending",
            FriendRequestStatus::Accepted => "accepted",
            FriendRequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(FriendRequestStatus::Pending),
            "accepted" => Some(FriendRequestStatus::Accepted),
            "rejected" => Some(FriendRequestStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for FriendRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Friend request row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FriendRequest {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
    StoryReaction,
}

impl NotificationKind {
    /// Database text representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
            NotificationKind::Follow => "follow",
            NotificationKind::StoryReaction => "story_reaction",
        }
    }
}

/// Notification row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub actor_id: i64,
    pub recipient_id: i64,
    pub target_id: Option<String>,
    pub target_type: Option<String>,
    pub preview_image_url: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification to be inserted.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub actor_id: i64,
    pub recipient_id: i64,
    pub target_id: Option<String>,
    pub target_type: Option<&'static str>,
    pub preview_image_url: Option<String>,
    pub message: String,
}

/// Notifications bucketed by age, newest first inside each bucket.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupedNotifications {
    pub today: Vec<Notification>,
    pub yesterday: Vec<Notification>,
    #[serde(rename = "thisWeek")]
    pub this_week: Vec<Notification>,
    pub older: Vec<Notification>,
}

/// Bookmarked post row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SavedPost {
    pub id: i64,
    pub user_id: i64,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Reaction left on a story.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoryReaction {
    pub id: i64,
    pub story_id: Uuid,
    pub user_id: i64,
    pub reaction: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friend_request_status_round_trips_through_text() {
        for status in [
            FriendRequestStatus::Pending,
            FriendRequestStatus::Accepted,
            FriendRequestStatus::Rejected,
        ] {
            assert_eq!(FriendRequestStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(FriendRequestStatus::parse("blocked"), None);
    }
}
