//! # nook_api
//!
//! HTTP API library for Nook.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use nook_core::auth::accounts::AccountService;
use nook_core::auth::identity::IdentityVerifier;
use nook_core::auth::session::SessionTokens;
use nook_core::store::UserStore;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{
    auth, comments, follows, friendships, health, likes, notifications, posts, saved, stories,
    users,
};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Relational store pool.
    pub pool: PgPool,
    /// Document store pool (posts, stories).
    pub docs: PgPool,
    /// Credential store.
    pub users: Arc<dyn UserStore>,
    pub accounts: Arc<AccountService>,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        pool: PgPool,
        docs: PgPool,
        users: Arc<dyn UserStore>,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        let tokens = SessionTokens::new(config.jwt_secret.as_bytes(), config.session_ttl);
        let accounts = Arc::new(AccountService::new(users.clone(), tokens, verifier));
        Self {
            config,
            pool,
            docs,
            users,
            accounts,
        }
    }
}

/// Run embedded migrations for both stores.
pub async fn migrate(pool: &PgPool, docs: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    nook_core::migrate::migrate_relational(pool).await?;
    nook_core::migrate::migrate_documents(docs).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_HEALTH, get(health::health))
        .route(routes::POST_AUTH_SIGNUP, post(auth::signup_handler))
        .route(routes::POST_AUTH_SIGNIN, post(auth::signin_handler))
        .route(
            routes::POST_AUTH_FIREBASE_LOGIN,
            post(auth::firebase_login_handler),
        )
        .route(routes::POST_AUTH_REGISTER, post(auth::register_handler));

    // Identity used when present, anonymous otherwise
    let optional = Router::new()
        .route(routes::POSTS, get(posts::list_posts))
        .route(routes::POSTS_ID, get(posts::get_post))
        .route(routes::GET_FEED, get(posts::feed))
        .route(routes::GET_POSTS_ID_LIKES_COUNT, get(likes::likes_count))
        .route(routes::POSTS_ID_COMMENTS, get(comments::list_comments))
        .route(routes::STORIES, get(stories::list_stories))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::optional_auth,
        ));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(
            routes::PROFILE,
            get(users::get_profile)
                .put(users::update_profile)
                .delete(users::delete_profile),
        )
        .route(routes::GET_USERS_SEARCH, get(users::search_users))
        .route(routes::GET_USERS_SUGGESTED, get(users::suggested_users))
        .route(routes::GET_USERS_ID, get(users::get_user))
        .route(routes::GET_USERS_ID_FOLLOWERS, get(users::followers))
        .route(routes::GET_USERS_ID_FOLLOWING, get(users::following))
        .route(
            routes::USERS_ID_FOLLOW,
            post(follows::follow_user).delete(follows::unfollow_user),
        )
        .route(routes::POSTS, post(posts::create_post))
        .route(
            routes::POSTS_ID,
            put(posts::update_post).delete(posts::delete_post),
        )
        .route(
            routes::POSTS_ID_LIKES,
            post(likes::like_post).delete(likes::unlike_post),
        )
        .route(routes::GET_POSTS_ID_LIKES_STATUS, get(likes::like_status))
        .route(routes::POSTS_ID_COMMENTS, post(comments::create_comment))
        .route(
            routes::COMMENTS_ID,
            put(comments::update_comment).delete(comments::delete_comment),
        )
        .route(
            routes::COMMENTS_ID_LIKE,
            post(comments::like_comment).delete(comments::unlike_comment),
        )
        .route(
            routes::POSTS_ID_SAVE,
            post(saved::save_post).delete(saved::unsave_post),
        )
        .route(routes::GET_SAVED, get(saved::list_saved))
        .route(routes::POST_FRIENDS_REQUEST, post(friendships::send_request))
        .route(
            routes::GET_FRIENDS_REQUESTS_PENDING,
            get(friendships::pending_requests),
        )
        .route(
            routes::PUT_FRIENDS_REQUEST_ID_STATUS,
            put(friendships::respond_to_request),
        )
        .route(routes::GET_FRIENDS, get(friendships::list_friends))
        .route(routes::DELETE_FRIENDS_ID, delete(friendships::remove_friend))
        .route(routes::STORIES, post(stories::create_story))
        .route(routes::GET_STORIES_ID, get(stories::get_story))
        .route(routes::POST_STORIES_ID_SEEN, post(stories::mark_seen))
        .route(routes::POST_STORIES_ID_REACT, post(stories::react))
        .route(routes::GET_NOTIFICATIONS, get(notifications::list))
        .route(routes::GET_NOTIFICATIONS_GROUPED, get(notifications::grouped))
        .route(
            routes::GET_NOTIFICATIONS_UNREAD_COUNT,
            get(notifications::unread_count),
        )
        .route(routes::PUT_NOTIFICATIONS_ID_READ, put(notifications::mark_read))
        .route(
            routes::PUT_NOTIFICATIONS_READ_ALL,
            put(notifications::mark_all_read),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(optional)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
