//! Comment persistence.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::social::Comment;

pub async fn create_comment(
    pool: &PgPool,
    post_id: &Uuid,
    user_id: i64,
    content: &str,
) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (post_id, user_id, content)
        VALUES ($1, $2, $3)
        RETURNING id, post_id, user_id, content, created_at, updated_at
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .bind(content)
    .fetch_one(pool)
    .await
}

pub async fn get_comment(pool: &PgPool, id: i64) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        "SELECT id, post_id, user_id, content, created_at, updated_at FROM comments WHERE id = $1",
    )
    .bind(id)
    .fetch_one(pool)
    .await
}

/// Comments on a post, oldest first.
pub async fn list_for_post(pool: &PgPool, post_id: &Uuid) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, post_id, user_id, content, created_at, updated_at
        FROM comments
        WHERE post_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
}

pub async fn update_comment(pool: &PgPool, id: i64, content: &str) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        UPDATE comments SET content = $2, updated_at = now()
        WHERE id = $1
        RETURNING id, post_id, user_id, content, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(content)
    .fetch_one(pool)
    .await
}

/// Delete a comment and its likes.
pub async fn delete_comment(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
