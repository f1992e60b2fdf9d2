//! Identity domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! shapes in `nook_api::models`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Domain user, as persisted in the credential store.
///
/// The password hash never leaves the process: it is skipped on
/// serialization so any JSON rendering of a `User` is safe to return.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: Option<String>,
    /// Subject id at the external identity provider, once linked.
    pub external_id: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub is_private: bool,
    pub is_verified: bool,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Compact author/actor view used when embedding users in other payloads.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
            is_verified: self.is_verified,
        }
    }
}

/// Compact user view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub is_verified: bool,
}

/// How a new user proves who they are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// bcrypt hash of a locally chosen password.
    Password(String),
    /// Subject id issued by the external identity provider.
    External(String),
}

/// A user that has not been persisted yet.
///
/// Construct through [`NewUser::local`] or [`NewUser::external`]; every new
/// user therefore carries exactly one authentication method.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub credential: Credential,
}

impl NewUser {
    /// Locally registered account with a password hash.
    pub fn local(username: &str, display_name: &str, email: &str, password_hash: String) -> Self {
        Self {
            username: username.to_string(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            credential: Credential::Password(password_hash),
        }
    }

    /// Account backed by an external identity subject.
    pub fn external(username: &str, display_name: &str, email: &str, subject: &str) -> Self {
        Self {
            username: username.to_string(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            credential: Credential::External(subject.to_string()),
        }
    }

    pub fn password_hash(&self) -> Option<&str> {
        match &self.credential {
            Credential::Password(h) => Some(h),
            Credential::External(_) => None,
        }
    }

    pub fn external_id(&self) -> Option<&str> {
        match &self.credential {
            Credential::External(s) => Some(s),
            Credential::Password(_) => None,
        }
    }
}

/// Verified claims produced by the external identity provider.
///
/// Ephemeral: consumed by reconciliation, never stored as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub subject: String,
    pub email: Option<String>,
    /// The provider vouches for `email`. Only verified emails link accounts.
    pub email_verified: bool,
    pub display_name: Option<String>,
}

/// Claims embedded in session tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Local numeric user id.
    pub user_id: i64,
    /// User email at issuance time.
    pub email: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: 7,
            username: "ann1".into(),
            display_name: "Ann".into(),
            email: "ann@x.com".into(),
            password_hash: Some("$2b$10$secret".into()),
            external_id: None,
            bio: None,
            avatar_url: None,
            is_private: false,
            is_verified: false,
            followers_count: 0,
            following_count: 0,
            posts_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("password_hash"));
        assert!(!obj.contains_key("password"));
        assert_eq!(obj["email"], "ann@x.com");
    }

    #[test]
    fn new_user_carries_exactly_one_credential() {
        let local = NewUser::local("ann1", "Ann", "ann@x.com", "hash".into());
        assert_eq!(local.password_hash(), Some("hash"));
        assert_eq!(local.external_id(), None);

        let ext = NewUser::external("uid-1", "Ann", "ann@x.com", "uid-1");
        assert_eq!(ext.password_hash(), None);
        assert_eq!(ext.external_id(), Some("uid-1"));
    }
}
