//! Post like handlers.

use axum::Json;
use axum::extract::{Path, State};
use nook_core::likes;
use nook_core::models::social::NotificationKind;
use nook_core::posts::PostCounter;

use super::posts::load_post;
use super::{conflict_as, doc_id};
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthIdentity;
use crate::models::{Envelope, LikeStatusResponse, LikedResponse, LikesCountResponse};
use crate::services::side_effects::{self, Target};

/// `POST /posts/{id}/likes`
pub async fn like_post(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<LikedResponse>>> {
    let id = doc_id(&id, "post")?;
    let post = load_post(&state, &id).await?;

    likes::like_post(&state.pool, &id, identity.user_id)
        .await
        .map_err(|e| conflict_as(e, "Post already liked by this user"))?;
    side_effects::bump_post(&state.docs, &id, PostCounter::Likes, 1).await;

    if post.user_id != identity.user_id {
        let name = side_effects::actor_name(state.users.as_ref(), identity.user_id).await;
        side_effects::notify(
            &state.pool,
            NotificationKind::Like,
            identity.user_id,
            post.user_id,
            Target::post(&id, post.doc.image_urls.first().cloned()),
            format!("{name} liked your post"),
        )
        .await;
    }
    Ok(Json(Envelope::ok(LikedResponse { liked: true })))
}

/// `DELETE /posts/{id}/likes`
pub async fn unlike_post(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<LikedResponse>>> {
    let id = doc_id(&id, "post")?;
    load_post(&state, &id).await?;

    if !likes::unlike_post(&state.pool, &id, identity.user_id).await? {
        return Err(AppError::NotFound("Like not found".into()));
    }
    side_effects::bump_post(&state.docs, &id, PostCounter::Likes, -1).await;
    Ok(Json(Envelope::ok(LikedResponse { liked: false })))
}

/// `GET /posts/{id}/likes/count`
pub async fn likes_count(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<LikesCountResponse>>> {
    let id = doc_id(&id, "post")?;
    load_post(&state, &id).await?;
    let likes_count = likes::count_for_post(&state.pool, &id).await?;
    Ok(Json(Envelope::ok(LikesCountResponse {
        post_id: id,
        likes_count,
    })))
}

/// `GET /posts/{id}/likes/status`
pub async fn like_status(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<LikeStatusResponse>>> {
    let id = doc_id(&id, "post")?;
    load_post(&state, &id).await?;
    let has_liked = likes::has_liked(&state.pool, &id, identity.user_id).await?;
    Ok(Json(Envelope::ok(LikeStatusResponse {
        post_id: id,
        has_liked,
    })))
}
