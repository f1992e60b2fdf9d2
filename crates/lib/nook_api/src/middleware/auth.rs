//! Authorization middleware: Bearer token extraction and session
//! verification, plus the typed identity extractors handlers use.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;

/// Verified caller identity, placed in request extensions by
/// [`require_auth`] or [`optional_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub user_id: i64,
    pub email: String,
}

impl AuthIdentity {
    fn from_parts(parts: &Parts) -> Option<Self> {
        parts
            .extensions
            .get::<AuthIdentity>()
            .cloned()
            .filter(|id| id.user_id != 0)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts).ok_or_else(|| AppError::Unauthorized("User not authenticated".into()))
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for AuthIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// `Ok(None)` when the header is absent.
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header format".into()))?;
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
        {
            Ok(Some(token))
        }
        _ => Err(AppError::Unauthorized(
            "Invalid Authorization header format".into(),
        )),
    }
}

fn verify(state: &AppState, token: &str) -> Result<AuthIdentity, AppError> {
    let claims = state.accounts.tokens().verify(token).map_err(|e| {
        debug!(reason = %e, "session token rejected");
        AppError::Unauthorized("Invalid or expired token".into())
    })?;
    Ok(AuthIdentity {
        user_id: claims.user_id,
        email: claims.email,
    })
}

/// Axum middleware: rejects the request with 401 unless it carries a valid
/// session token, then injects [`AuthIdentity`] into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;
    let identity = verify(&state, token)?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Axum middleware for endpoints that also serve anonymous callers.
///
/// No header means anonymous. A header that is present but invalid is still
/// rejected with 401.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(token) = bearer_token(request.headers())? {
        let identity = verify(&state, token)?;
        request.extensions_mut().insert(identity);
    }
    Ok(next.run(request).await)
}
