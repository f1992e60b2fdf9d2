//! Route paths.

pub const GET_HEALTH: &str = "/health";

pub const POST_AUTH_SIGNUP: &str = "/api/v1/auth/signup";
pub const POST_AUTH_SIGNIN: &str = "/api/v1/auth/signin";
pub const POST_AUTH_FIREBASE_LOGIN: &str = "/api/v1/auth/firebase-login";
pub const POST_AUTH_REGISTER: &str = "/api/v1/auth/register";

pub const PROFILE: &str = "/api/v1/profile";
pub const GET_USERS_SEARCH: &str = "/api/v1/users/search";
pub const GET_USERS_SUGGESTED: &str = "/api/v1/users/suggested";
pub const GET_USERS_ID: &str = "/api/v1/users/{id}";
pub const GET_USERS_ID_FOLLOWERS: &str = "/api/v1/users/{id}/followers";
pub const GET_USERS_ID_FOLLOWING: &str = "/api/v1/users/{id}/following";
pub const USERS_ID_FOLLOW: &str = "/api/v1/users/{id}/follow";

pub const POSTS: &str = "/api/v1/posts";
pub const POSTS_ID: &str = "/api/v1/posts/{id}";
pub const GET_FEED: &str = "/api/v1/feed";

pub const POSTS_ID_LIKES: &str = "/api/v1/posts/{id}/likes";
pub const GET_POSTS_ID_LIKES_COUNT: &str = "/api/v1/posts/{id}/likes/count";
pub const GET_POSTS_ID_LIKES_STATUS: &str = "/api/v1/posts/{id}/likes/status";

pub const POSTS_ID_COMMENTS: &str = "/api/v1/posts/{id}/comments";
pub const COMMENTS_ID: &str = "/api/v1/comments/{id}";
pub const COMMENTS_ID_LIKE: &str = "/api/v1/comments/{id}/like";

pub const POSTS_ID_SAVE: &str = "/api/v1/posts/{id}/save";
pub const GET_SAVED: &str = "/api/v1/saved";

pub const POST_FRIENDS_REQUEST: &str = "/api/v1/friends/request";
pub const GET_FRIENDS_REQUESTS_PENDING: &str = "/api/v1/friends/requests/pending";
pub const PUT_FRIENDS_REQUEST_ID_STATUS: &str = "/api/v1/friends/request/{id}/status";
pub const GET_FRIENDS: &str = "/api/v1/friends";
pub const DELETE_FRIENDS_ID: &str = "/api/v1/friends/{id}";

pub const STORIES: &str = "/api/v1/stories";
pub const GET_STORIES_ID: &str = "/api/v1/stories/{id}";
pub const POST_STORIES_ID_SEEN: &str = "/api/v1/stories/{id}/seen";
pub const POST_STORIES_ID_REACT: &str = "/api/v1/stories/{id}/react";

pub const GET_NOTIFICATIONS: &str = "/api/v1/notifications";
pub const GET_NOTIFICATIONS_GROUPED: &str = "/api/v1/notifications/grouped";
pub const GET_NOTIFICATIONS_UNREAD_COUNT: &str = "/api/v1/notifications/unread-count";
pub const PUT_NOTIFICATIONS_ID_READ: &str = "/api/v1/notifications/{id}/read";
pub const PUT_NOTIFICATIONS_READ_ALL: &str = "/api/v1/notifications/read-all";
