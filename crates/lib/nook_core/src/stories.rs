//! Stories: documents in the document store, views and reactions in the
//! relational store.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::content::{
    MediaKind, STORY_ITEM_DURATION_SECS, STORY_LIFETIME_HOURS, Story, StoryItem,
};
use crate::models::social::StoryReaction;
use crate::uuid::uuidv7;

/// Build the single item a new story starts with.
pub fn new_item(kind: MediaKind, url: &str) -> StoryItem {
    StoryItem {
        id: format!("item_{}", uuidv7().simple()),
        kind,
        url: url.to_string(),
        duration: STORY_ITEM_DURATION_SECS,
        created_at: Utc::now(),
    }
}

/// Insert a story expiring [`STORY_LIFETIME_HOURS`] from now.
///
/// Takes the document pool.
pub async fn create_story(
    docs: &PgPool,
    user_id: i64,
    items: &[StoryItem],
) -> Result<Story, sqlx::Error> {
    let expires_at = Utc::now() + Duration::hours(STORY_LIFETIME_HOURS);
    sqlx::query_as::<_, Story>(
        r#"
        INSERT INTO stories (id, user_id, items, expires_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, items, expires_at, created_at
        "#,
    )
    .bind(uuidv7())
    .bind(user_id)
    .bind(sqlx::types::Json(items))
    .bind(expires_at)
    .fetch_one(docs)
    .await
}

/// Fetch a story by id. Takes the document pool.
pub async fn get_story(docs: &PgPool, id: &Uuid) -> Result<Story, sqlx::Error> {
    sqlx::query_as::<_, Story>(
        "SELECT id, user_id, items, expires_at, created_at FROM stories WHERE id = $1",
    )
    .bind(id)
    .fetch_one(docs)
    .await
}

/// Unexpired stories, newest first. Takes the document pool.
pub async fn active_stories(docs: &PgPool) -> Result<Vec<Story>, sqlx::Error> {
    sqlx::query_as::<_, Story>(
        r#"
        SELECT id, user_id, items, expires_at, created_at
        FROM stories
        WHERE expires_at > now()
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(docs)
    .await
}

/// Delete expired stories. Returns how many were removed.
pub async fn purge_expired(docs: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM stories WHERE expires_at <= now()")
        .execute(docs)
        .await?;
    Ok(result.rows_affected())
}

/// Record that `user_id` saw a story. Repeat calls are no-ops.
pub async fn mark_seen(pool: &PgPool, story_id: &Uuid, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO story_views (story_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (story_id, user_id) DO NOTHING
        "#,
    )
    .bind(story_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// The subset of `story_ids` that `user_id` has seen.
pub async fn seen_story_ids(
    pool: &PgPool,
    user_id: i64,
    story_ids: &[Uuid],
) -> Result<HashSet<Uuid>, sqlx::Error> {
    if story_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT story_id FROM story_views WHERE user_id = $1 AND story_id = ANY($2)",
    )
    .bind(user_id)
    .bind(story_ids)
    .fetch_all(pool)
    .await?;
    Ok(ids.into_iter().collect())
}

/// Store a reaction on a story.
pub async fn add_reaction(
    pool: &PgPool,
    story_id: &Uuid,
    user_id: i64,
    reaction: &str,
) -> Result<StoryReaction, sqlx::Error> {
    sqlx::query_as::<_, StoryReaction>(
        r#"
        INSERT INTO story_reactions (story_id, user_id, reaction)
        VALUES ($1, $2, $3)
        RETURNING id, story_id, user_id, reaction, created_at
        "#,
    )
    .bind(story_id)
    .bind(user_id)
    .bind(reaction)
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_uses_default_duration() {
        let item = new_item(MediaKind::Video, "https://cdn.example/v.mp4");
        assert_eq!(item.duration, STORY_ITEM_DURATION_SECS);
        assert_eq!(item.kind, MediaKind::Video);
        assert!(item.id.starts_with("item_"));
    }
}
