//! Bookmarked posts.

use std::collections::HashSet;

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::social::SavedPost;

/// Bookmark a post. A repeat save fails with `saved_posts_pair_key`.
pub async fn save(pool: &PgPool, user_id: i64, post_id: &Uuid) -> Result<SavedPost, sqlx::Error> {
    sqlx::query_as::<_, SavedPost>(
        r#"
        INSERT INTO saved_posts (user_id, post_id)
        VALUES ($1, $2)
        RETURNING id, user_id, post_id, created_at
        "#,
    )
    .bind(user_id)
    .bind(post_id)
    .fetch_one(pool)
    .await
}

/// Remove a bookmark. Returns whether one existed.
pub async fn unsave(pool: &PgPool, user_id: i64, post_id: &Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM saved_posts WHERE user_id = $1 AND post_id = $2")
        .bind(user_id)
        .bind(post_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// A user's bookmarks, newest first.
pub async fn list_saved(pool: &PgPool, user_id: i64) -> Result<Vec<SavedPost>, sqlx::Error> {
    sqlx::query_as::<_, SavedPost>(
        r#"
        SELECT id, user_id, post_id, created_at
        FROM saved_posts
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// The subset of `post_ids` bookmarked by `user_id`.
pub async fn saved_post_ids(
    pool: &PgPool,
    user_id: i64,
    post_ids: &[Uuid],
) -> Result<HashSet<Uuid>, sqlx::Error> {
    if post_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT post_id FROM saved_posts WHERE user_id = $1 AND post_id = ANY($2)",
    )
    .bind(user_id)
    .bind(post_ids)
    .fetch_all(pool)
    .await?;
    Ok(ids.into_iter().collect())
}
