//! Authentication request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::AppJson;
use crate::models::{
    AuthResponse, FirebaseLoginRequest, RegisterRequest, SignInRequest, SignUpRequest,
    UserResponse,
};
use crate::services::auth;

/// `POST /auth/signup`: create a local account.
pub async fn signup_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<SignUpRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let resp = auth::sign_up(&state.accounts, &body).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// `POST /auth/signin`: authenticate with email + password.
pub async fn signin_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<SignInRequest>,
) -> AppResult<Json<AuthResponse>> {
    let resp = auth::sign_in(&state.accounts, &body).await?;
    Ok(Json(resp))
}

/// `POST /auth/firebase-login`: exchange a provider ID token for a session.
pub async fn firebase_login_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<FirebaseLoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let resp = auth::login_external(&state.accounts, &body).await?;
    Ok(Json(resp))
}

/// `POST /auth/register`: legacy registration with a client-supplied
/// subject id. Kept for older clients; returns the user without a token.
#[allow(deprecated)]
pub async fn register_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let resp = auth::register_unverified(&state.accounts, &body).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
