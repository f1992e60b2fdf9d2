//! Request and response shapes for the HTTP API.

use chrono::{DateTime, Utc};
use nook_core::models::auth::{User, UserSummary};
use nook_core::models::content::{Post, StoryItem};
use nook_core::models::social::{FriendRequest, Notification};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Error body returned for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Success envelope for domain endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: None,
        }
    }

    pub fn paged(data: T, meta: PageMeta) -> Self {
        Self {
            success: true,
            data,
            meta: Some(meta),
        }
    }
}

/// Pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PageMeta {
    pub fn new(page: i64, per_page: i64, total_items: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total_items + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            current_page: page,
            total_pages,
            total_items,
            items_per_page: per_page,
            has_next_page: page < total_pages,
            has_previous_page: page > 1,
        }
    }
}

/// `?page=&limit=` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Clamp to a 1-based page and a limit in `1..=max`, returning
    /// `(page, limit, offset)`.
    pub fn resolve(&self, default_limit: i64, max: i64) -> (i64, i64, i64) {
        let page = self.page.filter(|p| *p >= 1).unwrap_or(1);
        let limit = self
            .limit
            .filter(|l| (1..=max).contains(l))
            .unwrap_or(default_limit);
        (page, limit, (page - 1) * limit)
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(length(min = 2, max = 50, message = "name must be between 2 and 50 characters"))]
    pub name: String,
    #[validate(length(min = 3, max = 30, message = "username must be between 3 and 30 characters"))]
    #[validate(custom(function = "crate::services::validation::username_chars"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirebaseLoginRequest {
    #[serde(rename = "idToken")]
    pub id_token: String,
}

/// Legacy registration body carrying a client-asserted subject id.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 50, message = "name must be between 2 and 50 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "firebase_uid is required"))]
    pub firebase_uid: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub is_private: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserSummary>,
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub video_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostRequest {
    pub content: Option<String>,
    pub image_urls: Option<Vec<String>>,
    pub video_urls: Option<Vec<String>>,
}

/// `GET /posts` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostListQuery {
    pub user_id: Option<i64>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Post with its author and the caller's relation to it.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<UserSummary>,
    pub is_liked: bool,
    pub is_saved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostResponse {
    pub post: PostView,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<PostView>,
}

// ---------------------------------------------------------------------------
// Likes, comments, saves
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct LikedResponse {
    pub liked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikesCountResponse {
    pub post_id: Uuid,
    pub likes_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikeStatusResponse {
    pub post_id: Uuid,
    pub has_liked: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub post_id: Uuid,
    pub author: Option<UserSummary>,
    pub content: String,
    pub likes_count: i64,
    pub is_liked: bool,
    pub replies_count: i64,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentResponse {
    pub comment: CommentView,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SavedResponse {
    pub saved: bool,
}

// ---------------------------------------------------------------------------
// Follows and friends
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct FollowingResponse {
    pub following: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FriendRequestBody {
    pub receiver_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FriendStatusBody {
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendRequestResponse {
    pub request: FriendRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendRequestsResponse {
    pub requests: Vec<FriendRequest>,
}

// ---------------------------------------------------------------------------
// Stories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStoryRequest {
    pub media_url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReactRequest {
    pub reaction: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoryView {
    pub id: Uuid,
    pub author: Option<UserSummary>,
    pub items: Vec<StoryItem>,
    pub has_unseen_items: bool,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoriesResponse {
    pub stories: Vec<StoryView>,
    #[serde(rename = "currentUserStory")]
    pub current_user_story: Option<StoryView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoryResponse {
    pub story: StoryView,
}

#[derive(Debug, Clone, Serialize)]
pub struct AckResponse {
    pub success: bool,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub actor: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<NotificationView>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupedViews {
    pub today: Vec<NotificationView>,
    pub yesterday: Vec<NotificationView>,
    #[serde(rename = "thisWeek")]
    pub this_week: Vec<NotificationView>,
    pub older: Vec<NotificationView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupedNotificationsResponse {
    pub notifications: GroupedViews,
    #[serde(rename = "unreadCount")]
    pub unread_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_meta_rounds_pages_up() {
        let meta = PageMeta::new(2, 10, 21);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next_page);
        assert!(meta.has_previous_page);

        let last = PageMeta::new(3, 10, 21);
        assert!(!last.has_next_page);
    }

    #[test]
    fn page_meta_serializes_camel_case() {
        let json = serde_json::to_value(PageMeta::new(1, 20, 0)).unwrap();
        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["totalPages"], 0);
        assert_eq!(json["hasPreviousPage"], false);
    }

    #[test]
    fn page_query_clamps_out_of_range_values() {
        let q = PageQuery {
            page: Some(0),
            limit: Some(500),
        };
        assert_eq!(q.resolve(20, 50), (1, 20, 0));

        let q = PageQuery {
            page: Some(3),
            limit: Some(5),
        };
        assert_eq!(q.resolve(20, 50), (3, 5, 10));
    }

    #[test]
    fn envelope_omits_missing_meta() {
        let json = serde_json::to_value(Envelope::ok(CountResponse { count: 4 })).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["count"], 4);
        assert!(json.get("meta").is_none());
    }
}
