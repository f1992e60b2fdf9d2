//! In-memory credential store for tests.
//!
//! Enforces the same uniqueness rules as the `users` table so conflict and
//! race handling can be exercised without a database.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::{StoreError, UserStore};
use crate::models::auth::{NewUser, User};

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: Vec<User>,
}

/// [`UserStore`] held in process memory.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.lock().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored user.
    pub fn all(&self) -> Vec<User> {
        self.lock().users.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn find_where(&self, pred: impl Fn(&User) -> bool) -> Result<User, StoreError> {
        self.lock()
            .users
            .iter()
            .find(|u| pred(u))
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

/// Name of the unique constraint `candidate` would violate, if any.
fn violated_constraint(users: &[User], candidate: &User) -> Option<&'static str> {
    for u in users.iter().filter(|u| u.id != candidate.id) {
        if u.username == candidate.username {
            return Some("users_username_key");
        }
        if u.email == candidate.email {
            return Some("users_email_key");
        }
        if candidate.external_id.is_some() && u.external_id == candidate.external_id {
            return Some("users_external_id_key");
        }
    }
    None
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: i64) -> Result<User, StoreError> {
        self.find_where(|u| u.id == id)
    }

    async fn find_by_external_subject(&self, subject: &str) -> Result<User, StoreError> {
        self.find_where(|u| u.external_id.as_deref() == Some(subject))
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.find_where(|u| u.email == email)
    }

    async fn find_by_username(&self, username: &str) -> Result<User, StoreError> {
        self.find_where(|u| u.username == username)
    }

    async fn find_many(&self, ids: &[i64]) -> Result<Vec<User>, StoreError> {
        Ok(self
            .lock()
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.lock();
        let now = Utc::now();
        let candidate = User {
            id: inner.next_id + 1,
            password_hash: user.password_hash().map(str::to_string),
            external_id: user.external_id().map(str::to_string),
            username: user.username,
            display_name: user.display_name,
            email: user.email,
            bio: None,
            avatar_url: None,
            is_private: false,
            is_verified: false,
            followers_count: 0,
            following_count: 0,
            posts_count: 0,
            created_at: now,
            updated_at: now,
        };
        if let Some(constraint) = violated_constraint(&inner.users, &candidate) {
            return Err(StoreError::Conflict(constraint.to_string()));
        }
        inner.next_id = candidate.id;
        inner.users.push(candidate.clone());
        Ok(candidate)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let mut inner = self.lock();
        if let Some(constraint) = violated_constraint(&inner.users, user) {
            return Err(StoreError::Conflict(constraint.to_string()));
        }
        let slot = inner
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(StoreError::NotFound)?;
        slot.username = user.username.clone();
        slot.display_name = user.display_name.clone();
        slot.email = user.email.clone();
        slot.external_id = user.external_id.clone();
        slot.bio = user.bio.clone();
        slot.avatar_url = user.avatar_url.clone();
        slot.is_private = user.is_private;
        slot.updated_at = Utc::now();
        Ok(slot.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let before = inner.users.len();
        inner.users.retain(|u| u.id != id);
        if inner.users.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>, StoreError> {
        let needle = query.to_lowercase();
        let mut found: Vec<User> = self
            .lock()
            .users
            .iter()
            .filter(|u| {
                u.display_name.to_lowercase().contains(&needle)
                    || u.username.to_lowercase().contains(&needle)
                    || u.email.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        found.truncate(limit.max(0) as usize);
        Ok(found)
    }

    async fn list(&self, exclude: i64, limit: i64) -> Result<Vec<User>, StoreError> {
        let mut found: Vec<User> = self
            .lock()
            .users
            .iter()
            .filter(|u| u.id != exclude)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        found.truncate(limit.max(0) as usize);
        Ok(found)
    }
}
