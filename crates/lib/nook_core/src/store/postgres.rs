//! PostgreSQL credential store.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{StoreError, UserStore};
use crate::models::auth::{NewUser, User};

const USER_COLUMNS: &str = "id, username, display_name, email, password_hash, external_id, bio, \
     avatar_url, is_private, is_verified, followers_count, following_count, posts_count, \
     created_at, updated_at";

/// [`UserStore`] over the relational database's `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<User, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        user.ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: i64) -> Result<User, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_external_subject(&self, subject: &str) -> Result<User, StoreError> {
        self.find_one("external_id", subject).await
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.find_one("email", email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<User, StoreError> {
        self.find_one("username", username).await
    }

    async fn find_many(&self, ids: &[i64]) -> Result<Vec<User>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (username, display_name, email, password_hash, external_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.display_name)
            .bind(&user.email)
            .bind(user.password_hash())
            .bind(user.external_id())
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let sql = format!(
            "UPDATE users SET username = $2, display_name = $3, email = $4, external_id = $5, \
             bio = $6, avatar_url = $7, is_private = $8, updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.display_name)
            .bind(&user.email)
            .bind(&user.external_id)
            .bind(&user.bio)
            .bind(&user.avatar_url)
            .bind(user.is_private)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>, StoreError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE display_name ILIKE $1 OR username ILIKE $1 OR email ILIKE $1 \
             ORDER BY username LIMIT $2"
        );
        let pattern = format!("%{}%", escape_like(query));
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn list(&self, exclude: i64, limit: i64) -> Result<Vec<User>, StoreError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id <> $1 ORDER BY created_at DESC LIMIT $2"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(exclude)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }
}

/// Escape `ILIKE` wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
