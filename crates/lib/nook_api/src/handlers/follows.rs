//! Follow handlers.

use axum::Json;
use axum::extract::{Path, State};
use nook_core::counters::UserCounter;
use nook_core::follows;
use nook_core::models::social::NotificationKind;
use tracing::debug;

use super::{conflict_as, row_id};
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthIdentity;
use crate::models::{Envelope, FollowingResponse};
use crate::services::side_effects::{self, Target};

/// `POST /users/{id}/follow`
pub async fn follow_user(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<FollowingResponse>>> {
    let target = row_id(&id, "user")?;
    if target == identity.user_id {
        return Err(AppError::Validation("Cannot follow yourself".into()));
    }
    state.users.find_by_id(target).await?;

    follows::follow(&state.pool, identity.user_id, target)
        .await
        .map_err(|e| conflict_as(e, "Already following this user"))?;
    debug!(follower = identity.user_id, following = target, "followed");

    side_effects::bump_user(&state.pool, identity.user_id, UserCounter::Following, 1).await;
    side_effects::bump_user(&state.pool, target, UserCounter::Followers, 1).await;

    let name = side_effects::actor_name(state.users.as_ref(), identity.user_id).await;
    side_effects::notify(
        &state.pool,
        NotificationKind::Follow,
        identity.user_id,
        target,
        Target::user(identity.user_id),
        format!("{name} started following you"),
    )
    .await;

    Ok(Json(Envelope::ok(FollowingResponse { following: true })))
}

/// `DELETE /users/{id}/follow`
pub async fn unfollow_user(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<FollowingResponse>>> {
    let target = row_id(&id, "user")?;
    if !follows::unfollow(&state.pool, identity.user_id, target).await? {
        return Err(AppError::NotFound("Not following this user".into()));
    }
    side_effects::bump_user(&state.pool, identity.user_id, UserCounter::Following, -1).await;
    side_effects::bump_user(&state.pool, target, UserCounter::Followers, -1).await;
    Ok(Json(Envelope::ok(FollowingResponse { following: false })))
}
