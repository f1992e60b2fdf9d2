//! Request handlers, one module per resource.

pub mod auth;
pub mod comments;
pub mod follows;
pub mod friendships;
pub mod health;
pub mod likes;
pub mod notifications;
pub mod posts;
pub mod saved;
pub mod stories;
pub mod users;

use nook_core::uuid::parse_id;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Parse a UUID path segment naming a document (post, story).
pub(crate) fn doc_id(raw: &str, what: &str) -> AppResult<Uuid> {
    parse_id(raw).ok_or_else(|| AppError::Validation(format!("Invalid {what} ID")))
}

/// Parse a numeric path segment.
pub(crate) fn row_id(raw: &str, what: &str) -> AppResult<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::Validation(format!("Invalid {what} ID")))
}

/// Map a unique violation to a 409 carrying `message`.
pub(crate) fn conflict_as(e: sqlx::Error, message: &str) -> AppError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        other => other.into(),
    }
}

/// Map a missing row to a 404 carrying `message`.
pub(crate) fn not_found_as(e: sqlx::Error, message: &str) -> AppError {
    match e {
        sqlx::Error::RowNotFound => AppError::NotFound(message.to_string()),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_id_rejects_non_positive_and_garbage() {
        assert_eq!(row_id("42", "user").unwrap(), 42);
        assert!(row_id("0", "user").is_err());
        assert!(row_id("-3", "user").is_err());
        assert!(row_id("abc", "user").is_err());
    }

    #[test]
    fn doc_id_requires_uuid() {
        let id = Uuid::now_v7();
        assert_eq!(doc_id(&id.to_string(), "post").unwrap(), id);
        assert!(doc_id("507f1f77bcf86cd799439011", "post").is_err());
    }
}
