//! API server configuration.

use std::fmt;
use std::time::Duration;

use nook_core::auth::session::SESSION_TTL_HOURS;
use tracing::warn;

/// Signing secret used when `JWT_SECRET` is unset. Anyone who knows it can
/// mint valid session tokens, so production deployments must override it.
pub const FALLBACK_JWT_SECRET: &str = "supersecretjwtkey";

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "0.0.0.0:8080").
    pub bind_addr: String,
    /// Relational store connection URL.
    pub database_url: String,
    /// Document store connection URL.
    pub document_database_url: String,
    /// Session token signing secret.
    pub jwt_secret: String,
    /// Session token lifetime.
    pub session_ttl: chrono::Duration,
    /// Firebase project id. External login is disabled when unset.
    pub firebase_project_id: Option<String>,
    /// Bound on every call to the identity provider.
    pub identity_timeout: Duration,
    /// Maximum connections per pool.
    pub max_connections: u32,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("firebase_project_id", &self.firebase_project_id)
            .field("session_ttl", &self.session_ttl)
            .field("identity_timeout", &self.identity_timeout)
            .field("max_connections", &self.max_connections)
            .finish_non_exhaustive()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        let database_url = "postgres://localhost:5432/nook".to_string();
        Self {
            bind_addr: "0.0.0.0:8080".into(),
            document_database_url: database_url.clone(),
            database_url,
            jwt_secret: FALLBACK_JWT_SECRET.into(),
            session_ttl: chrono::Duration::hours(SESSION_TTL_HOURS),
            firebase_project_id: None,
            identity_timeout: Duration::from_secs(10),
            max_connections: 5,
        }
    }
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                       | Default                          |
    /// |--------------------------------|----------------------------------|
    /// | `BIND_ADDR`                    | `0.0.0.0:8080`                   |
    /// | `DATABASE_URL`                 | `postgres://localhost:5432/nook` |
    /// | `DOCUMENT_DATABASE_URL`        | value of `DATABASE_URL`          |
    /// | `JWT_SECRET`                   | insecure fixed fallback          |
    /// | `FIREBASE_PROJECT_ID`          | unset (external login disabled)  |
    /// | `IDENTITY_VERIFY_TIMEOUT_SECS` | `10`                             |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let database_url = env_nonempty("DATABASE_URL").unwrap_or(defaults.database_url);
        Self {
            bind_addr: env_nonempty("BIND_ADDR").unwrap_or(defaults.bind_addr),
            document_database_url: env_nonempty("DOCUMENT_DATABASE_URL")
                .unwrap_or_else(|| database_url.clone()),
            database_url,
            jwt_secret: resolve_jwt_secret(env_nonempty("JWT_SECRET")),
            session_ttl: defaults.session_ttl,
            firebase_project_id: env_nonempty("FIREBASE_PROJECT_ID"),
            identity_timeout: env_nonempty("IDENTITY_VERIFY_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.identity_timeout),
            max_connections: defaults.max_connections,
        }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Pick the configured secret, falling back to [`FALLBACK_JWT_SECRET`].
pub fn resolve_jwt_secret(configured: Option<String>) -> String {
    match configured {
        Some(secret) => secret,
        None => {
            warn!("JWT_SECRET is not set; using the insecure built-in fallback secret");
            FALLBACK_JWT_SECRET.to_string()
        }
    }
}
