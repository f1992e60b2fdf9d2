//! Post likes and comment likes.

use std::collections::{HashMap, HashSet};

use sqlx::PgPool;
use uuid::Uuid;

/// Like a post. A repeat like fails with the `likes_pair_key` unique violation.
pub async fn like_post(pool: &PgPool, post_id: &Uuid, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO likes (post_id, user_id) VALUES ($1, $2)")
        .bind(post_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove a like. Returns whether one existed.
pub async fn unlike_post(pool: &PgPool, post_id: &Uuid, user_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM likes WHERE post_id = $1 AND user_id = $2")
        .bind(post_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn has_liked(pool: &PgPool, post_id: &Uuid, user_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM likes WHERE post_id = $1 AND user_id = $2)",
    )
    .bind(post_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn count_for_post(pool: &PgPool, post_id: &Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes WHERE post_id = $1")
        .bind(post_id)
        .fetch_one(pool)
        .await
}

/// The subset of `post_ids` liked by `user_id`.
pub async fn liked_post_ids(
    pool: &PgPool,
    user_id: i64,
    post_ids: &[Uuid],
) -> Result<HashSet<Uuid>, sqlx::Error> {
    if post_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT post_id FROM likes WHERE user_id = $1 AND post_id = ANY($2)",
    )
    .bind(user_id)
    .bind(post_ids)
    .fetch_all(pool)
    .await?;
    Ok(ids.into_iter().collect())
}

/// Like a comment. A repeat like fails with `comment_likes_pair_key`.
pub async fn like_comment(pool: &PgPool, comment_id: i64, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO comment_likes (comment_id, user_id) VALUES ($1, $2)")
        .bind(comment_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn unlike_comment(
    pool: &PgPool,
    comment_id: i64,
    user_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comment_likes WHERE comment_id = $1 AND user_id = $2")
        .bind(comment_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Like counts per comment. Comments without likes are absent.
pub async fn comment_like_counts(
    pool: &PgPool,
    comment_ids: &[i64],
) -> Result<HashMap<i64, i64>, sqlx::Error> {
    if comment_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT comment_id, COUNT(*)
        FROM comment_likes
        WHERE comment_id = ANY($1)
        GROUP BY comment_id
        "#,
    )
    .bind(comment_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().collect())
}

/// The subset of `comment_ids` liked by `user_id`.
pub async fn liked_comment_ids(
    pool: &PgPool,
    user_id: i64,
    comment_ids: &[i64],
) -> Result<HashSet<i64>, sqlx::Error> {
    if comment_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT comment_id FROM comment_likes WHERE user_id = $1 AND comment_id = ANY($2)",
    )
    .bind(user_id)
    .bind(comment_ids)
    .fetch_all(pool)
    .await?;
    Ok(ids.into_iter().collect())
}
