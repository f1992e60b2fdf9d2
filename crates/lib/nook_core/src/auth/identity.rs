//! External identity verification.
//!
//! The provider's ID tokens are RS256 JWTs signed by keys published as a
//! JWKS document. Keys are cached for a fixed TTL and refetched once when a
//! token names a key id the cache does not know.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::AuthError;
use crate::models::auth::ExternalIdentity;

/// Public signing keys for Firebase ID tokens.
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Issuer prefix for Firebase ID tokens; the project id is appended.
pub const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

const JWKS_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Verifies identity tokens issued by a third-party provider.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<ExternalIdentity, AuthError>;
}

/// Rejects every token. Used when no provider is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledVerifier;

#[async_trait]
impl IdentityVerifier for DisabledVerifier {
    async fn verify(&self, _id_token: &str) -> Result<ExternalIdentity, AuthError> {
        Err(AuthError::ExternalIdentity(
            "external login is not configured".to_string(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct ProviderClaims {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
}

struct CachedKeys {
    fetched_at: Instant,
    keys: Arc<JwkSet>,
}

/// Firebase Authentication ID token verifier.
pub struct FirebaseVerifier {
    client: Client,
    project_id: String,
    jwks_url: String,
    cache: RwLock<Option<CachedKeys>>,
}

impl FirebaseVerifier {
    /// Build a verifier for `project_id`. Every provider request is bounded
    /// by `timeout`.
    pub fn new(project_id: &str, timeout: Duration) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            client,
            project_id: project_id.to_string(),
            jwks_url: FIREBASE_JWKS_URL.to_string(),
            cache: RwLock::new(None),
        })
    }

    /// Override the JWKS endpoint.
    pub fn with_jwks_url(mut self, url: &str) -> Self {
        self.jwks_url = url.to_string();
        self
    }

    pub fn issuer(&self) -> String {
        format!("{FIREBASE_ISSUER_PREFIX}{}", self.project_id)
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let res = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::ExternalIdentity(format!("jwks fetch: {e}")))?;

        if !res.status().is_success() {
            return Err(AuthError::ExternalIdentity(format!(
                "jwks endpoint returned {}",
                res.status()
            )));
        }

        res.json::<JwkSet>()
            .await
            .map_err(|e| AuthError::ExternalIdentity(format!("invalid jwks payload: {e}")))
    }

    /// Current key set, refetched when stale or when `force` is set.
    ///
    /// The cache lock is never held across the network call.
    async fn keys(&self, force: bool) -> Result<Arc<JwkSet>, AuthError> {
        if !force {
            let cached = self.cache.read().await;
            if let Some(c) = cached.as_ref()
                && c.fetched_at.elapsed() < JWKS_CACHE_TTL
            {
                return Ok(Arc::clone(&c.keys));
            }
        }

        let keys = Arc::new(self.fetch_jwks().await?);
        debug!(count = keys.keys.len(), "refreshed identity provider keys");
        *self.cache.write().await = Some(CachedKeys {
            fetched_at: Instant::now(),
            keys: Arc::clone(&keys),
        });
        Ok(keys)
    }
}

fn select_jwk<'a>(jwks: &'a JwkSet, kid: &str) -> Option<&'a Jwk> {
    jwks.keys
        .iter()
        .find(|jwk| jwk.common.key_id.as_deref() == Some(kid))
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, id_token: &str) -> Result<ExternalIdentity, AuthError> {
        let header = decode_header(id_token)
            .map_err(|_| AuthError::ExternalIdentity("malformed id token".to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::ExternalIdentity(
                "unexpected id token algorithm".to_string(),
            ));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::ExternalIdentity("id token has no key id".to_string()))?;

        let mut keys = self.keys(false).await?;
        if select_jwk(&keys, &kid).is_none() {
            keys = self.keys(true).await?;
        }
        let jwk = select_jwk(&keys, &kid)
            .ok_or_else(|| AuthError::ExternalIdentity("unknown signing key".to_string()))?;
        let key = DecodingKey::from_jwk(jwk)
            .map_err(|e| AuthError::ExternalIdentity(format!("unusable signing key: {e}")))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer()]);
        validation.validate_exp = true;

        let claims = decode::<ProviderClaims>(id_token, &key, &validation)
            .map_err(|e| {
                warn!(error = %e, "id token rejected");
                AuthError::ExternalIdentity("invalid id token".to_string())
            })?
            .claims;

        identity_from_claims(claims)
    }
}

fn identity_from_claims(claims: ProviderClaims) -> Result<ExternalIdentity, AuthError> {
    if claims.sub.trim().is_empty() {
        return Err(AuthError::ExternalIdentity("id token has empty subject".to_string()));
    }
    Ok(ExternalIdentity {
        subject: claims.sub,
        email: claims.email.filter(|e| !e.is_empty()),
        email_verified: claims.email_verified == Some(true),
        display_name: claims.name.filter(|n| !n.is_empty()),
    })
}
