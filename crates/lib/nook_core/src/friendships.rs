//! Friend requests and friendships.
//!
//! A friendship is an accepted request. At most one pending or accepted
//! request may exist per unordered pair of users.

use sqlx::PgPool;

use crate::models::social::{FriendRequest, FriendRequestStatus};

const COLUMNS: &str = "id, sender_id, receiver_id, status, created_at, updated_at";

/// Open a pending request. Fails with the `friend_requests_active_pair`
/// unique violation when the pair already has an active request.
pub async fn send(
    pool: &PgPool,
    sender_id: i64,
    receiver_id: i64,
) -> Result<FriendRequest, sqlx::Error> {
    let sql = format!(
        "INSERT INTO friend_requests (sender_id, receiver_id, status) \
         VALUES ($1, $2, 'pending') RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, FriendRequest>(&sql)
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_one(pool)
        .await
}

pub async fn get(pool: &PgPool, id: i64) -> Result<FriendRequest, sqlx::Error> {
    let sql = format!("SELECT {COLUMNS} FROM friend_requests WHERE id = $1");
    sqlx::query_as::<_, FriendRequest>(&sql)
        .bind(id)
        .fetch_one(pool)
        .await
}

/// The pending or accepted request between two users, in either direction.
pub async fn active_between(
    pool: &PgPool,
    a: i64,
    b: i64,
) -> Result<Option<FriendRequest>, sqlx::Error> {
    let sql = format!(
        "SELECT {COLUMNS} FROM friend_requests \
         WHERE ((sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1)) \
           AND status IN ('pending', 'accepted') \
         LIMIT 1"
    );
    sqlx::query_as::<_, FriendRequest>(&sql)
        .bind(a)
        .bind(b)
        .fetch_optional(pool)
        .await
}

/// Pending requests addressed to `receiver_id`, newest first.
pub async fn pending_for(pool: &PgPool, receiver_id: i64) -> Result<Vec<FriendRequest>, sqlx::Error> {
    let sql = format!(
        "SELECT {COLUMNS} FROM friend_requests \
         WHERE receiver_id = $1 AND status = 'pending' ORDER BY created_at DESC"
    );
    sqlx::query_as::<_, FriendRequest>(&sql)
        .bind(receiver_id)
        .fetch_all(pool)
        .await
}

pub async fn set_status(
    pool: &PgPool,
    id: i64,
    status: FriendRequestStatus,
) -> Result<FriendRequest, sqlx::Error> {
    let sql = format!(
        "UPDATE friend_requests SET status = $2, updated_at = now() \
         WHERE id = $1 RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, FriendRequest>(&sql)
        .bind(id)
        .bind(status.as_str())
        .fetch_one(pool)
        .await
}

/// Ids of users with an accepted request to or from `user_id`.
pub async fn friend_ids(pool: &PgPool, user_id: i64) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT CASE WHEN sender_id = $1 THEN receiver_id ELSE sender_id END
        FROM friend_requests
        WHERE (sender_id = $1 OR receiver_id = $1) AND status = 'accepted'
        ORDER BY updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM friend_requests WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
