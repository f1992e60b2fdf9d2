//! Authentication core.
//!
//! Session tokens, password hashing, external identity verification and
//! the account use-cases built on the credential store.

pub mod accounts;
pub mod identity;
pub mod password;
pub mod session;

use thiserror::Error;

use crate::store::StoreError;

/// Session token verification failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Malformed token")]
    Malformed,
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately does not say which.
    #[error("Invalid credentials")]
    CredentialError,

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("External identity rejected: {0}")]
    ExternalIdentity(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(c) => AuthError::Conflict(conflict_message(&c).to_string()),
            other => AuthError::Store(other),
        }
    }
}

/// Client-facing message for a violated users constraint.
pub fn conflict_message(constraint: &str) -> &'static str {
    if constraint.contains("email") {
        "Email already registered"
    } else if constraint.contains("username") {
        "Username already taken"
    } else if constraint.contains("external") {
        "External identity already registered"
    } else {
        "Account already exists"
    }
}
