//! Profile and user lookup handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use nook_core::follows;
use tracing::info;

use super::row_id;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::middleware::auth::AuthIdentity;
use crate::models::{
    Envelope, PageMeta, PageQuery, SearchQuery, UpdateProfileRequest, UserResponse, UsersResponse,
};
use crate::services::{enrich, validation};

const SEARCH_LIMIT: i64 = 20;
const SUGGESTED_LIMIT: i64 = 10;
const BIO_MAX_LEN: usize = 160;

/// `GET /profile`
pub async fn get_profile(
    State(state): State<AppState>,
    identity: AuthIdentity,
) -> AppResult<Json<Envelope<UserResponse>>> {
    let user = state.users.find_by_id(identity.user_id).await?;
    Ok(Json(Envelope::ok(UserResponse { user })))
}

/// `PUT /profile`: partial update; absent fields are left unchanged.
pub async fn update_profile(
    State(state): State<AppState>,
    identity: AuthIdentity,
    AppJson(body): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<Envelope<UserResponse>>> {
    let mut user = state.users.find_by_id(identity.user_id).await?;

    if let Some(name) = body.display_name.as_deref().map(str::trim) {
        validation::length("display_name", name, validation::NAME_LEN)?;
        user.display_name = name.to_string();
    }
    if let Some(username) = body.username.as_deref().map(str::trim) {
        validation::username(username)?;
        user.username = username.to_string();
    }
    if let Some(email) = body.email.as_deref().map(str::trim) {
        validation::email(email)?;
        user.email = email.to_string();
    }
    if let Some(bio) = body.bio {
        validation::length("bio", &bio, (0, BIO_MAX_LEN))?;
        user.bio = Some(bio).filter(|b| !b.is_empty());
    }
    if let Some(avatar) = body.avatar_url {
        if avatar.is_empty() {
            user.avatar_url = None;
        } else {
            validation::url("avatar_url", &avatar)?;
            user.avatar_url = Some(avatar);
        }
    }
    if let Some(is_private) = body.is_private {
        user.is_private = is_private;
    }

    let user = state.users.update(&user).await?;
    Ok(Json(Envelope::ok(UserResponse { user })))
}

/// `DELETE /profile`
///
/// Tokens already issued to the account stay valid until they expire.
pub async fn delete_profile(
    State(state): State<AppState>,
    identity: AuthIdentity,
) -> AppResult<StatusCode> {
    state.users.delete(identity.user_id).await?;
    info!(user_id = identity.user_id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /users/{id}`
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<UserResponse>>> {
    let id = row_id(&id, "user")?;
    let user = state.users.find_by_id(id).await?;
    Ok(Json(Envelope::ok(UserResponse { user })))
}

/// `GET /users/search?q=`
pub async fn search_users(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> AppResult<Json<Envelope<UsersResponse>>> {
    let q = query.q.as_deref().map(str::trim).unwrap_or_default();
    if q.is_empty() {
        return Err(AppError::Validation("Search query 'q' is required".into()));
    }
    let users = state.users.search(q, SEARCH_LIMIT).await?;
    Ok(Json(Envelope::ok(UsersResponse {
        users: users.iter().map(|u| u.summary()).collect(),
    })))
}

/// `GET /users/suggested`: other users, newest first.
pub async fn suggested_users(
    State(state): State<AppState>,
    identity: AuthIdentity,
) -> AppResult<Json<Envelope<UsersResponse>>> {
    let users = state.users.list(identity.user_id, SUGGESTED_LIMIT).await?;
    Ok(Json(Envelope::ok(UsersResponse {
        users: users.iter().map(|u| u.summary()).collect(),
    })))
}

/// `GET /users/{id}/followers`
pub async fn followers(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppQuery(page): AppQuery<PageQuery>,
) -> AppResult<Json<Envelope<UsersResponse>>> {
    let id = row_id(&id, "user")?;
    let user = state.users.find_by_id(id).await?;
    let (page, limit, offset) = page.resolve(20, 100);
    let ids = follows::follower_ids(&state.pool, id, limit, offset).await?;
    let users = ordered_summaries(&state, ids).await?;
    Ok(Json(Envelope::paged(
        UsersResponse { users },
        PageMeta::new(page, limit, user.followers_count),
    )))
}

/// `GET /users/{id}/following`
pub async fn following(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppQuery(page): AppQuery<PageQuery>,
) -> AppResult<Json<Envelope<UsersResponse>>> {
    let id = row_id(&id, "user")?;
    let user = state.users.find_by_id(id).await?;
    let (page, limit, offset) = page.resolve(20, 100);
    let ids = follows::following_ids(&state.pool, id, limit, offset).await?;
    let users = ordered_summaries(&state, ids).await?;
    Ok(Json(Envelope::paged(
        UsersResponse { users },
        PageMeta::new(page, limit, user.following_count),
    )))
}

/// Summaries in the order of `ids`, dropping users that no longer exist.
async fn ordered_summaries(
    state: &AppState,
    ids: Vec<i64>,
) -> AppResult<Vec<nook_core::models::auth::UserSummary>> {
    let mut map = enrich::summaries(state.users.as_ref(), ids.iter().copied()).await?;
    Ok(ids.iter().filter_map(|id| map.remove(id)).collect())
}
