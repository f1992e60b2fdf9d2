//! Saved post handlers.

use axum::Json;
use axum::extract::{Path, State};
use nook_core::{posts, saved_posts};

use super::posts::load_post;
use super::{conflict_as, doc_id};
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthIdentity;
use crate::models::{Envelope, PostsResponse, SavedResponse};
use crate::services::enrich;

/// `POST /posts/{id}/save`
pub async fn save_post(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<SavedResponse>>> {
    let id = doc_id(&id, "post")?;
    load_post(&state, &id).await?;
    saved_posts::save(&state.pool, identity.user_id, &id)
        .await
        .map_err(|e| conflict_as(e, "Post already saved"))?;
    Ok(Json(Envelope::ok(SavedResponse { saved: true })))
}

/// `DELETE /posts/{id}/save`
pub async fn unsave_post(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<SavedResponse>>> {
    let id = doc_id(&id, "post")?;
    if !saved_posts::unsave(&state.pool, identity.user_id, &id).await? {
        return Err(AppError::NotFound("Saved post not found".into()));
    }
    Ok(Json(Envelope::ok(SavedResponse { saved: false })))
}

/// `GET /saved`: most recently saved first. Posts deleted since saving are
/// skipped.
pub async fn list_saved(
    State(state): State<AppState>,
    identity: AuthIdentity,
) -> AppResult<Json<Envelope<PostsResponse>>> {
    let saved = saved_posts::list_saved(&state.pool, identity.user_id).await?;
    let ids: Vec<_> = saved.iter().map(|s| s.post_id).collect();
    let mut found = posts::get_posts(&state.docs, &ids).await?;
    found.sort_by_key(|p| ids.iter().position(|id| *id == p.id));
    let posts = enrich::post_views(&state, Some(identity.user_id), found).await?;
    Ok(Json(Envelope::ok(PostsResponse { posts })))
}
