//! Credential store contract.
//!
//! Every auth flow reads and writes users through [`UserStore`]. The
//! Postgres implementation backs the server; the in-memory one backs tests.

#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::auth::{NewUser, User};

pub use postgres::PgUserStore;

/// Credential store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found")]
    NotFound,

    /// A unique constraint rejected the write. Carries the constraint name.
    #[error("Conflict on {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Db(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::Conflict(db.constraint().unwrap_or("unique").to_string())
            }
            other => StoreError::Db(other),
        }
    }
}

/// Persistence of user identity records.
///
/// Lookups return [`StoreError::NotFound`] when no row matches. Writes that
/// collide with an existing username, email or external subject return
/// [`StoreError::Conflict`]. No multi-call atomicity is offered.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<User, StoreError>;

    async fn find_by_external_subject(&self, subject: &str) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<User, StoreError>;

    /// Fetch all users whose id is in `ids`. Unknown ids are skipped.
    async fn find_many(&self, ids: &[i64]) -> Result<Vec<User>, StoreError>;

    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Persist profile fields and the external link. Counters and the
    /// password hash are left untouched.
    async fn update(&self, user: &User) -> Result<User, StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    /// Case-insensitive substring match on display name, username or email.
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>, StoreError>;

    /// Users other than `exclude`, newest first.
    async fn list(&self, exclude: i64, limit: i64) -> Result<Vec<User>, StoreError>;
}
