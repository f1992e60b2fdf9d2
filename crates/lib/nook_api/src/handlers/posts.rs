//! Post and feed handlers. Posts live in the document store.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use nook_core::counters::UserCounter;
use nook_core::models::content::{Post, PostDoc};
use nook_core::posts;
use tracing::info;
use uuid::Uuid;

use super::{doc_id, not_found_as};
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::middleware::auth::AuthIdentity;
use crate::models::{
    CreatePostRequest, Envelope, PageMeta, PageQuery, PostListQuery, PostResponse, PostsResponse,
    UpdatePostRequest,
};
use crate::services::{enrich, side_effects, validation};

const LIST_DEFAULT_LIMIT: i64 = 20;
const LIST_MAX_LIMIT: i64 = 100;
const FEED_DEFAULT_LIMIT: i64 = 10;
const FEED_MAX_LIMIT: i64 = 50;

/// Load a post, mapping a missing row to 404.
pub(crate) async fn load_post(state: &AppState, id: &Uuid) -> AppResult<Post> {
    posts::get_post(&state.docs, id)
        .await
        .map_err(|e| not_found_as(e, "Post not found"))
}

fn validate_doc(doc: &PostDoc) -> AppResult<()> {
    validation::length("content", &doc.content, validation::POST_LEN)?;
    validation::urls("image_urls", &doc.image_urls)?;
    validation::urls("video_urls", &doc.video_urls)?;
    Ok(())
}

/// `POST /posts`
pub async fn create_post(
    State(state): State<AppState>,
    identity: AuthIdentity,
    AppJson(body): AppJson<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<Envelope<PostResponse>>)> {
    let doc = PostDoc {
        content: body.content,
        image_urls: body.image_urls,
        video_urls: body.video_urls,
        ..PostDoc::default()
    };
    validate_doc(&doc)?;

    let post = posts::create_post(&state.docs, identity.user_id, &doc).await?;
    side_effects::bump_user(&state.pool, identity.user_id, UserCounter::Posts, 1).await;
    info!(post_id = %post.id, user_id = identity.user_id, "post created");

    let post = enrich::post_view(&state, Some(identity.user_id), post).await?;
    Ok((StatusCode::CREATED, Json(Envelope::ok(PostResponse { post }))))
}

/// `GET /posts/{id}`
pub async fn get_post(
    State(state): State<AppState>,
    identity: Option<AuthIdentity>,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<PostResponse>>> {
    let id = doc_id(&id, "post")?;
    let post = load_post(&state, &id).await?;
    let post = enrich::post_view(&state, identity.map(|i| i.user_id), post).await?;
    Ok(Json(Envelope::ok(PostResponse { post })))
}

/// `GET /posts?user_id=&skip=&limit=`
pub async fn list_posts(
    State(state): State<AppState>,
    identity: Option<AuthIdentity>,
    AppQuery(query): AppQuery<PostListQuery>,
) -> AppResult<Json<Envelope<PostsResponse>>> {
    let skip = query.skip.filter(|s| *s >= 0).unwrap_or(0);
    let limit = query
        .limit
        .filter(|l| (1..=LIST_MAX_LIMIT).contains(l))
        .unwrap_or(LIST_DEFAULT_LIMIT);

    let rows = posts::list_posts(&state.docs, query.user_id, skip, limit).await?;
    let total = posts::count_posts(&state.docs, query.user_id).await?;
    let posts = enrich::post_views(&state, identity.map(|i| i.user_id), rows).await?;
    Ok(Json(Envelope::paged(
        PostsResponse { posts },
        PageMeta::new(skip / limit + 1, limit, total),
    )))
}

/// `PUT /posts/{id}`: owner only.
pub async fn update_post(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdatePostRequest>,
) -> AppResult<Json<Envelope<PostResponse>>> {
    let id = doc_id(&id, "post")?;
    let existing = load_post(&state, &id).await?;
    if existing.user_id != identity.user_id {
        return Err(AppError::Forbidden(
            "You are not authorized to update this post".into(),
        ));
    }

    let mut doc = existing.doc;
    if let Some(content) = body.content {
        doc.content = content;
    }
    if let Some(urls) = body.image_urls {
        doc.image_urls = urls;
    }
    if let Some(urls) = body.video_urls {
        doc.video_urls = urls;
    }
    validate_doc(&doc)?;

    let post = posts::update_post(&state.docs, &id, &doc).await?;
    let post = enrich::post_view(&state, Some(identity.user_id), post).await?;
    Ok(Json(Envelope::ok(PostResponse { post })))
}

/// `DELETE /posts/{id}`: owner only.
pub async fn delete_post(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = doc_id(&id, "post")?;
    let existing = load_post(&state, &id).await?;
    if existing.user_id != identity.user_id {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this post".into(),
        ));
    }

    if posts::delete_post(&state.docs, &id).await? {
        side_effects::bump_user(&state.pool, identity.user_id, UserCounter::Posts, -1).await;
        info!(post_id = %id, user_id = identity.user_id, "post deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /feed?page=&limit=`: newest posts across all authors.
pub async fn feed(
    State(state): State<AppState>,
    identity: Option<AuthIdentity>,
    AppQuery(page): AppQuery<PageQuery>,
) -> AppResult<Json<Envelope<PostsResponse>>> {
    let (page, limit, offset) = page.resolve(FEED_DEFAULT_LIMIT, FEED_MAX_LIMIT);
    let rows = posts::list_posts(&state.docs, None, offset, limit).await?;
    let total = posts::count_posts(&state.docs, None).await?;
    let posts = enrich::post_views(&state, identity.map(|i| i.user_id), rows).await?;
    Ok(Json(Envelope::paged(
        PostsResponse { posts },
        PageMeta::new(page, limit, total),
    )))
}
