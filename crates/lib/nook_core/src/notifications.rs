//! Notification persistence and age grouping.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use crate::models::social::{GroupedNotifications, NewNotification, Notification};

/// Cap on the `older` bucket of [`grouped`].
pub const OLDER_LIMIT: i64 = 50;

const COLUMNS: &str = "id, kind, actor_id, recipient_id, target_id, target_type, \
     preview_image_url, message, is_read, created_at";

pub async fn create(pool: &PgPool, n: &NewNotification) -> Result<Notification, sqlx::Error> {
    let sql = format!(
        "INSERT INTO notifications \
         (kind, actor_id, recipient_id, target_id, target_type, preview_image_url, message) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, Notification>(&sql)
        .bind(n.kind.as_str())
        .bind(n.actor_id)
        .bind(n.recipient_id)
        .bind(&n.target_id)
        .bind(n.target_type)
        .bind(&n.preview_image_url)
        .bind(&n.message)
        .fetch_one(pool)
        .await
}

/// A page of a recipient's notifications, newest first, with the total.
pub async fn list(
    pool: &PgPool,
    recipient_id: i64,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Notification>, i64), sqlx::Error> {
    let total =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notifications WHERE recipient_id = $1")
            .bind(recipient_id)
            .fetch_one(pool)
            .await?;

    let sql = format!(
        "SELECT {COLUMNS} FROM notifications WHERE recipient_id = $1 \
         ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
    );
    let rows = sqlx::query_as::<_, Notification>(&sql)
        .bind(recipient_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok((rows, total))
}

/// Start of each age bucket relative to `now` (UTC day boundaries).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Buckets {
    pub today: DateTime<Utc>,
    pub yesterday: DateTime<Utc>,
    pub week: DateTime<Utc>,
}

impl Buckets {
    pub fn at(now: DateTime<Utc>) -> Self {
        let today = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|d| d.and_utc())
            .unwrap_or(now);
        Self {
            today,
            yesterday: today - Duration::days(1),
            week: today - Duration::days(7),
        }
    }

    /// Sort notifications (already newest first) into their buckets.
    pub fn split(&self, notifications: Vec<Notification>) -> GroupedNotifications {
        let mut grouped = GroupedNotifications::default();
        for n in notifications {
            let bucket = if n.created_at >= self.today {
                &mut grouped.today
            } else if n.created_at >= self.yesterday {
                &mut grouped.yesterday
            } else if n.created_at >= self.week {
                &mut grouped.this_week
            } else {
                &mut grouped.older
            };
            bucket.push(n);
        }
        grouped
    }
}

/// A recipient's notifications grouped by age. `older` holds at most
/// [`OLDER_LIMIT`] entries.
pub async fn grouped(
    pool: &PgPool,
    recipient_id: i64,
    now: DateTime<Utc>,
) -> Result<GroupedNotifications, sqlx::Error> {
    let buckets = Buckets::at(now);

    let recent_sql = format!(
        "SELECT {COLUMNS} FROM notifications WHERE recipient_id = $1 AND created_at >= $2 \
         ORDER BY created_at DESC, id DESC"
    );
    let mut rows = sqlx::query_as::<_, Notification>(&recent_sql)
        .bind(recipient_id)
        .bind(buckets.week)
        .fetch_all(pool)
        .await?;

    let older_sql = format!(
        "SELECT {COLUMNS} FROM notifications WHERE recipient_id = $1 AND created_at < $2 \
         ORDER BY created_at DESC, id DESC LIMIT $3"
    );
    let older = sqlx::query_as::<_, Notification>(&older_sql)
        .bind(recipient_id)
        .bind(buckets.week)
        .bind(OLDER_LIMIT)
        .fetch_all(pool)
        .await?;

    rows.extend(older);
    Ok(buckets.split(rows))
}

pub async fn unread_count(pool: &PgPool, recipient_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND NOT is_read",
    )
    .bind(recipient_id)
    .fetch_one(pool)
    .await
}

/// Mark one notification read. Scoped to the recipient: returns `false`
/// when the id does not exist or belongs to someone else.
pub async fn mark_read(pool: &PgPool, id: i64, recipient_id: i64) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND recipient_id = $2")
            .bind(id)
            .bind(recipient_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

/// Mark every unread notification read. Returns how many changed.
pub async fn mark_all_read(pool: &PgPool, recipient_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = TRUE WHERE recipient_id = $1 AND NOT is_read",
    )
    .bind(recipient_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
