//! Post persistence in the document store.
//!
//! All functions here take the document pool.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::content::{Post, PostDoc};
use crate::uuid::uuidv7;

/// Counters kept inside the post document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCounter {
    Likes,
    Comments,
}

impl PostCounter {
    fn key(self) -> &'static str {
        match self {
            PostCounter::Likes => "likes_count",
            PostCounter::Comments => "comments_count",
        }
    }
}

/// Insert a new post authored by `user_id`.
pub async fn create_post(pool: &PgPool, user_id: i64, doc: &PostDoc) -> Result<Post, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (id, user_id, doc)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, doc, created_at, updated_at
        "#,
    )
    .bind(uuidv7())
    .bind(user_id)
    .bind(sqlx::types::Json(doc))
    .fetch_one(pool)
    .await
}

/// Fetch a post by id.
pub async fn get_post(pool: &PgPool, id: &Uuid) -> Result<Post, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        "SELECT id, user_id, doc, created_at, updated_at FROM posts WHERE id = $1",
    )
    .bind(id)
    .fetch_one(pool)
    .await
}

/// Posts newest first, optionally restricted to one author.
pub async fn list_posts(
    pool: &PgPool,
    author: Option<i64>,
    offset: i64,
    limit: i64,
) -> Result<Vec<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        SELECT id, user_id, doc, created_at, updated_at
        FROM posts
        WHERE $1::BIGINT IS NULL OR user_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(author)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Number of posts, optionally restricted to one author.
pub async fn count_posts(pool: &PgPool, author: Option<i64>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM posts WHERE $1::BIGINT IS NULL OR user_id = $1",
    )
    .bind(author)
    .fetch_one(pool)
    .await
}

/// Fetch the posts in `ids`. Missing ids are skipped.
pub async fn get_posts(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Post>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, Post>(
        r#"
        SELECT id, user_id, doc, created_at, updated_at
        FROM posts
        WHERE id = ANY($1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await
}

/// Replace a post's document body. Counters are carried over from the
/// stored document, not from `doc`.
pub async fn update_post(pool: &PgPool, id: &Uuid, doc: &PostDoc) -> Result<Post, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        UPDATE posts
        SET doc = $2::jsonb
                  || jsonb_build_object(
                       'likes_count', COALESCE(doc->'likes_count', '0'::jsonb),
                       'comments_count', COALESCE(doc->'comments_count', '0'::jsonb)),
            updated_at = now()
        WHERE id = $1
        RETURNING id, user_id, doc, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(sqlx::types::Json(doc))
    .fetch_one(pool)
    .await
}

/// Delete a post. Returns whether a row was removed.
pub async fn delete_post(pool: &PgPool, id: &Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Add `delta` to one of the post's counters, never going below zero.
pub async fn adjust_counter(
    pool: &PgPool,
    id: &Uuid,
    counter: PostCounter,
    delta: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE posts
        SET doc = jsonb_set(
            doc,
            ARRAY[$2::TEXT],
            to_jsonb(GREATEST(COALESCE((doc->>$2)::BIGINT, 0) + $3, 0)))
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(counter.key())
    .bind(delta)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_keys_match_document_fields() {
        let doc = serde_json::to_value(PostDoc {
            likes_count: 1,
            comments_count: 2,
            ..PostDoc::default()
        })
        .unwrap();
        assert_eq!(doc[PostCounter::Likes.key()], 1);
        assert_eq!(doc[PostCounter::Comments.key()], 2);
    }
}
