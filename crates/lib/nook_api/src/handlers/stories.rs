//! Story handlers. Stories live in the document store and expire after
//! 24 hours.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use nook_core::models::content::{MediaKind, Story};
use nook_core::models::social::NotificationKind;
use nook_core::stories;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{doc_id, not_found_as};
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::AuthIdentity;
use crate::models::{
    AckResponse, CreateStoryRequest, Envelope, ReactRequest, StoriesResponse, StoryResponse,
    StoryView,
};
use crate::services::side_effects::{self, Target};
use crate::services::{enrich, validation};

/// Load an unexpired story.
async fn load_story(state: &AppState, id: &Uuid) -> AppResult<Story> {
    let story = stories::get_story(&state.docs, id)
        .await
        .map_err(|e| not_found_as(e, "Story not found"))?;
    if story.expires_at <= Utc::now() {
        return Err(AppError::NotFound("Story not found".into()));
    }
    Ok(story)
}

async fn single_view(state: &AppState, viewer: Option<i64>, story: Story) -> AppResult<StoryView> {
    enrich::story_views(state, viewer, vec![story])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("story view lost during enrichment".into()))
}

/// `POST /stories`
pub async fn create_story(
    State(state): State<AppState>,
    identity: AuthIdentity,
    AppJson(body): AppJson<CreateStoryRequest>,
) -> AppResult<(StatusCode, Json<Envelope<StoryResponse>>)> {
    let kind = MediaKind::parse(&body.kind)
        .ok_or_else(|| AppError::Validation("type must be one of: image, video".into()))?;
    validation::url("media_url", &body.media_url)?;

    let item = stories::new_item(kind, &body.media_url);
    let story = stories::create_story(&state.docs, identity.user_id, &[item]).await?;
    debug!(story_id = %story.id, user_id = identity.user_id, "story created");

    let story = single_view(&state, Some(identity.user_id), story).await?;
    Ok((StatusCode::CREATED, Json(Envelope::ok(StoryResponse { story }))))
}

/// `GET /stories`: active stories, the caller's own newest story split out.
pub async fn list_stories(
    State(state): State<AppState>,
    identity: Option<AuthIdentity>,
) -> AppResult<Json<Envelope<StoriesResponse>>> {
    match stories::purge_expired(&state.docs).await {
        Ok(0) => {}
        Ok(n) => debug!(purged = n, "expired stories removed"),
        Err(e) => warn!(error = %e, "expired story purge failed"),
    }

    let viewer = identity.map(|i| i.user_id);
    let active = stories::active_stories(&state.docs).await?;
    let (own, others): (Vec<Story>, Vec<Story>) = active
        .into_iter()
        .partition(|s| Some(s.user_id) == viewer);

    // newest first, so the caller's first story is their latest
    let current_user_story = match own.into_iter().next() {
        Some(story) => Some(single_view(&state, viewer, story).await?),
        None => None,
    };
    let others = enrich::story_views(&state, viewer, others).await?;

    Ok(Json(Envelope::ok(StoriesResponse {
        stories: others,
        current_user_story,
    })))
}

/// `GET /stories/{id}`
pub async fn get_story(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<StoryResponse>>> {
    let id = doc_id(&id, "story")?;
    let story = load_story(&state, &id).await?;
    let story = single_view(&state, Some(identity.user_id), story).await?;
    Ok(Json(Envelope::ok(StoryResponse { story })))
}

/// `POST /stories/{id}/seen`: idempotent.
pub async fn mark_seen(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<AckResponse>>> {
    let id = doc_id(&id, "story")?;
    load_story(&state, &id).await?;
    stories::mark_seen(&state.pool, &id, identity.user_id).await?;
    Ok(Json(Envelope::ok(AckResponse { success: true })))
}

/// `POST /stories/{id}/react`
pub async fn react(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
    AppJson(body): AppJson<ReactRequest>,
) -> AppResult<Json<Envelope<AckResponse>>> {
    let id = doc_id(&id, "story")?;
    validation::required("reaction", &body.reaction)?;
    let story = load_story(&state, &id).await?;

    stories::add_reaction(&state.pool, &id, identity.user_id, &body.reaction).await?;

    let name = side_effects::actor_name(state.users.as_ref(), identity.user_id).await;
    side_effects::notify(
        &state.pool,
        NotificationKind::StoryReaction,
        identity.user_id,
        story.user_id,
        Target::story(&id),
        format!("{name} reacted {} to your story", body.reaction),
    )
    .await;

    Ok(Json(Envelope::ok(AckResponse { success: true })))
}
