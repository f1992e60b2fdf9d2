//! Notification handlers. Every query is scoped to the caller as recipient.

use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use nook_core::notifications;

use super::row_id;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::AppQuery;
use crate::middleware::auth::AuthIdentity;
use crate::models::{
    AckResponse, CountResponse, Envelope, GroupedNotificationsResponse, NotificationsResponse,
    PageMeta, PageQuery,
};
use crate::services::enrich;

/// `GET /notifications?page=&limit=`
pub async fn list(
    State(state): State<AppState>,
    identity: AuthIdentity,
    AppQuery(page): AppQuery<PageQuery>,
) -> AppResult<Json<Envelope<NotificationsResponse>>> {
    let (page, limit, offset) = page.resolve(20, 100);
    let (rows, total) = notifications::list(&state.pool, identity.user_id, limit, offset).await?;
    let notifications = enrich::notification_views(&state, rows).await?;
    Ok(Json(Envelope::paged(
        NotificationsResponse { notifications },
        PageMeta::new(page, limit, total),
    )))
}

/// `GET /notifications/grouped`
pub async fn grouped(
    State(state): State<AppState>,
    identity: AuthIdentity,
) -> AppResult<Json<Envelope<GroupedNotificationsResponse>>> {
    let grouped = notifications::grouped(&state.pool, identity.user_id, Utc::now()).await?;
    let unread_count = notifications::unread_count(&state.pool, identity.user_id).await?;
    let notifications = enrich::grouped_views(&state, grouped).await?;
    Ok(Json(Envelope::ok(GroupedNotificationsResponse {
        notifications,
        unread_count,
    })))
}

/// `GET /notifications/unread-count`
pub async fn unread_count(
    State(state): State<AppState>,
    identity: AuthIdentity,
) -> AppResult<Json<Envelope<CountResponse>>> {
    let count = notifications::unread_count(&state.pool, identity.user_id).await?;
    Ok(Json(Envelope::ok(CountResponse { count })))
}

/// `PUT /notifications/{id}/read`
pub async fn mark_read(
    State(state): State<AppState>,
    identity: AuthIdentity,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<AckResponse>>> {
    let id = row_id(&id, "notification")?;
    if !notifications::mark_read(&state.pool, id, identity.user_id).await? {
        return Err(AppError::NotFound("Notification not found".into()));
    }
    Ok(Json(Envelope::ok(AckResponse { success: true })))
}

/// `PUT /notifications/read-all`
pub async fn mark_all_read(
    State(state): State<AppState>,
    identity: AuthIdentity,
) -> AppResult<Json<Envelope<CountResponse>>> {
    let updated = notifications::mark_all_read(&state.pool, identity.user_id).await?;
    Ok(Json(Envelope::ok(CountResponse {
        count: i64::try_from(updated).unwrap_or(i64::MAX),
    })))
}
