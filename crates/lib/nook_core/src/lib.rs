//! # nook_core
//!
//! Core domain logic for Nook: authentication, the credential store and
//! the relational and document queries behind the social features.

pub mod auth;
pub mod comments;
pub mod counters;
pub mod follows;
pub mod friendships;
pub mod likes;
pub mod migrate;
pub mod models;
pub mod notifications;
pub mod posts;
pub mod saved_posts;
pub mod store;
pub mod stories;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
