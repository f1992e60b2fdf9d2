//! Denormalized user counters.

use sqlx::PgPool;

/// A counter column on `users`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCounter {
    Followers,
    Following,
    Posts,
}

impl UserCounter {
    fn column(self) -> &'static str {
        match self {
            UserCounter::Followers => "followers_count",
            UserCounter::Following => "following_count",
            UserCounter::Posts => "posts_count",
        }
    }
}

/// Add `delta` to a user's counter, never going below zero.
pub async fn adjust(
    pool: &PgPool,
    user_id: i64,
    counter: UserCounter,
    delta: i64,
) -> Result<(), sqlx::Error> {
    let column = counter.column();
    let sql = format!("UPDATE users SET {column} = GREATEST({column} + $2, 0) WHERE id = $1");
    sqlx::query(&sql)
        .bind(user_id)
        .bind(delta)
        .execute(pool)
        .await?;
    Ok(())
}
