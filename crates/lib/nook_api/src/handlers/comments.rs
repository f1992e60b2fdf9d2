//! Comment and comment-like handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use nook_core::comments;
use nook_core::likes;
use nook_core::models::social::{Comment, NotificationKind};
use nook_core::posts::PostCounter;

use super::posts::load_post;
use super::{conflict_as, doc_id, not_found_as, row_id};
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::AuthIdentity;
use crate::models::{
    CommentRequest, CommentResponse, CommentsResponse, DeletedResponse, Envelope, LikedResponse,
};
use crate::services::side_effects::{self, Target};
use crate::services::{enrich, validation};

async fn load_comment(state: &AppState, raw_id: &str) -> AppResult<Comment> {
    let id = row_id(raw_id, "comment")?;
    comments::get_comment(&state.pool, id)
        .await
        .map_err(|e| not_found_as(e, "Comment not found"))
}

/// `POST /posts/{id}/comments`
pub async fn create_comment(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
    AppJson(body): AppJson<CommentRequest>,
) -> AppResult<(StatusCode, Json<Envelope<CommentResponse>>)> {
    let post_id = doc_id(&id, "post")?;
    validation::length("content", &body.content, validation::COMMENT_LEN)?;
    let post = load_post(&state, &post_id).await?;

    let comment =
        comments::create_comment(&state.pool, &post_id, identity.user_id, &body.content).await?;
    side_effects::bump_post(&state.docs, &post_id, PostCounter::Comments, 1).await;

    if post.user_id != identity.user_id {
        let name = side_effects::actor_name(state.users.as_ref(), identity.user_id).await;
        side_effects::notify(
            &state.pool,
            NotificationKind::Comment,
            identity.user_id,
            post.user_id,
            Target::post(&post_id, post.doc.image_urls.first().cloned()),
            format!("{name} commented on your post"),
        )
        .await;
    }

    let mut views = enrich::comment_views(&state, Some(identity.user_id), vec![comment]).await?;
    let comment = views
        .pop()
        .ok_or_else(|| AppError::Internal("comment view lost during enrichment".into()))?;
    Ok((StatusCode::CREATED, Json(Envelope::ok(CommentResponse { comment }))))
}

/// `GET /posts/{id}/comments`: oldest first.
pub async fn list_comments(
    State(state): State<AppState>,
    identity: Option<AuthIdentity>,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<CommentsResponse>>> {
    let post_id = doc_id(&id, "post")?;
    load_post(&state, &post_id).await?;
    let rows = comments::list_for_post(&state.pool, &post_id).await?;
    let comments = enrich::comment_views(&state, identity.map(|i| i.user_id), rows).await?;
    Ok(Json(Envelope::ok(CommentsResponse { comments })))
}

/// `PUT /comments/{id}`: author only.
pub async fn update_comment(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
    AppJson(body): AppJson<CommentRequest>,
) -> AppResult<Json<Envelope<CommentResponse>>> {
    validation::length("content", &body.content, validation::COMMENT_LEN)?;
    let existing = load_comment(&state, &id).await?;
    if existing.user_id != identity.user_id {
        return Err(AppError::Forbidden(
            "You are not authorized to update this comment".into(),
        ));
    }

    let comment = comments::update_comment(&state.pool, existing.id, &body.content).await?;
    let mut views = enrich::comment_views(&state, Some(identity.user_id), vec![comment]).await?;
    let comment = views
        .pop()
        .ok_or_else(|| AppError::Internal("comment view lost during enrichment".into()))?;
    Ok(Json(Envelope::ok(CommentResponse { comment })))
}

/// `DELETE /comments/{id}`: author only.
pub async fn delete_comment(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<DeletedResponse>>> {
    let existing = load_comment(&state, &id).await?;
    if existing.user_id != identity.user_id {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this comment".into(),
        ));
    }

    if comments::delete_comment(&state.pool, existing.id).await? {
        side_effects::bump_post(&state.docs, &existing.post_id, PostCounter::Comments, -1).await;
    }
    Ok(Json(Envelope::ok(DeletedResponse { deleted: true })))
}

/// `POST /comments/{id}/like`
pub async fn like_comment(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<LikedResponse>>> {
    let comment = load_comment(&state, &id).await?;
    likes::like_comment(&state.pool, comment.id, identity.user_id)
        .await
        .map_err(|e| conflict_as(e, "Comment already liked"))?;
    Ok(Json(Envelope::ok(LikedResponse { liked: true })))
}

/// `DELETE /comments/{id}/like`
pub async fn unlike_comment(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<LikedResponse>>> {
    let comment = load_comment(&state, &id).await?;
    if !likes::unlike_comment(&state.pool, comment.id, identity.user_id).await? {
        return Err(AppError::NotFound("Like not found".into()));
    }
    Ok(Json(Envelope::ok(LikedResponse { liked: false })))
}
