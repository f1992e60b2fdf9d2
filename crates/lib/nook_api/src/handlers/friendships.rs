//! Friend request and friendship handlers.

use axum::Json;
use axum::extract::{Path, State};
use nook_core::friendships;
use nook_core::models::social::FriendRequestStatus;
use nook_core::store::StoreError;
use tracing::info;

use super::{conflict_as, not_found_as, row_id};
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::AuthIdentity;
use crate::models::{
    DeletedResponse, Envelope, FriendRequestBody, FriendRequestResponse, FriendRequestsResponse,
    FriendStatusBody, UsersResponse,
};
use crate::services::enrich;

/// `POST /friends/request`
pub async fn send_request(
    State(state): State<AppState>,
    identity: AuthIdentity,
    AppJson(body): AppJson<FriendRequestBody>,
) -> AppResult<Json<Envelope<FriendRequestResponse>>> {
    if body.receiver_id == identity.user_id {
        return Err(AppError::Validation(
            "Cannot send a friend request to yourself".into(),
        ));
    }
    match state.users.find_by_id(body.receiver_id).await {
        Ok(_) => {}
        Err(StoreError::NotFound) => {
            return Err(AppError::NotFound("Receiver user not found".into()));
        }
        Err(e) => return Err(e.into()),
    }
    if friendships::active_between(&state.pool, identity.user_id, body.receiver_id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "A friend request already exists between these users".into(),
        ));
    }

    // Concurrent senders trip friend_requests_active_pair.
    let request = friendships::send(&state.pool, identity.user_id, body.receiver_id)
        .await
        .map_err(|e| conflict_as(e, "A friend request already exists between these users"))?;
    info!(request_id = request.id, sender = identity.user_id, receiver = body.receiver_id, "friend request sent");
    Ok(Json(Envelope::ok(FriendRequestResponse { request })))
}

/// `GET /friends/requests/pending`: requests addressed to the caller.
pub async fn pending_requests(
    State(state): State<AppState>,
    identity: AuthIdentity,
) -> AppResult<Json<Envelope<FriendRequestsResponse>>> {
    let requests = friendships::pending_for(&state.pool, identity.user_id).await?;
    Ok(Json(Envelope::ok(FriendRequestsResponse { requests })))
}

/// `PUT /friends/request/{id}/status`: receiver only.
pub async fn respond_to_request(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
    AppJson(body): AppJson<FriendStatusBody>,
) -> AppResult<Json<Envelope<FriendRequestResponse>>> {
    let id = row_id(&id, "request")?;
    let status = match FriendRequestStatus::parse(&body.status) {
        Some(s @ (FriendRequestStatus::Accepted | FriendRequestStatus::Rejected)) => s,
        _ => {
            return Err(AppError::Validation(
                "status must be one of: accepted, rejected".into(),
            ));
        }
    };

    let request = friendships::get(&state.pool, id)
        .await
        .map_err(|e| not_found_as(e, "Friend request not found"))?;
    if request.receiver_id != identity.user_id {
        return Err(AppError::Forbidden(
            "You are not authorized to update this friend request".into(),
        ));
    }
    if request.status != FriendRequestStatus::Pending.as_str() {
        return Err(AppError::Validation(
            "Friend request has already been answered".into(),
        ));
    }

    let request = friendships::set_status(&state.pool, id, status).await?;
    Ok(Json(Envelope::ok(FriendRequestResponse { request })))
}

/// `GET /friends`
pub async fn list_friends(
    State(state): State<AppState>,
    identity: AuthIdentity,
) -> AppResult<Json<Envelope<UsersResponse>>> {
    let ids = friendships::friend_ids(&state.pool, identity.user_id).await?;
    let mut map = enrich::summaries(state.users.as_ref(), ids.iter().copied()).await?;
    let users = ids.iter().filter_map(|id| map.remove(id)).collect();
    Ok(Json(Envelope::ok(UsersResponse { users })))
}

/// `DELETE /friends/{id}`: `id` is the friend's user id.
pub async fn remove_friend(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<DeletedResponse>>> {
    let friend_id = row_id(&id, "friend user")?;
    let friendship = friendships::active_between(&state.pool, identity.user_id, friend_id)
        .await?
        .filter(|r| r.status == FriendRequestStatus::Accepted.as_str())
        .ok_or_else(|| AppError::Validation("Users are not friends".into()))?;

    friendships::delete(&state.pool, friendship.id).await?;
    Ok(Json(Envelope::ok(DeletedResponse { deleted: true })))
}
