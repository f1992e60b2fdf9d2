//! Authentication flows: request validation in front of
//! [`nook_core::auth::accounts::AccountService`].

use nook_core::auth::accounts::{AccountService, SignUp, UnverifiedRegistration};
use tracing::info;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    AuthResponse, FirebaseLoginRequest, RegisterRequest, SignInRequest, SignUpRequest,
    UserResponse,
};
use crate::services::validation;

/// Create a local account and open a session for it.
pub async fn sign_up(accounts: &AccountService, req: &SignUpRequest) -> AppResult<AuthResponse> {
    req.validate()?;
    let session = accounts
        .sign_up(SignUp {
            name: &req.name,
            username: &req.username,
            email: &req.email,
            password: &req.password,
        })
        .await?;
    Ok(AuthResponse {
        token: session.token,
        user: session.user,
    })
}

pub async fn sign_in(accounts: &AccountService, req: &SignInRequest) -> AppResult<AuthResponse> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("email and password are required".into()));
    }
    let session = accounts.sign_in(email, &req.password).await?;
    info!(user_id = session.user.id, "signed in");
    Ok(AuthResponse {
        token: session.token,
        user: session.user,
    })
}

/// Exchange a provider ID token for a session.
pub async fn login_external(
    accounts: &AccountService,
    req: &FirebaseLoginRequest,
) -> AppResult<AuthResponse> {
    validation::required("idToken", &req.id_token)?;
    let session = accounts.login_external(&req.id_token).await?;
    info!(user_id = session.user.id, "signed in with external identity");
    Ok(AuthResponse {
        token: session.token,
        user: session.user,
    })
}

/// Legacy registration with a client-asserted subject id. No token is issued.
#[deprecated(note = "trusts an unverified subject id; use `login_external`")]
pub async fn register_unverified(
    accounts: &AccountService,
    req: &RegisterRequest,
) -> AppResult<UserResponse> {
    req.validate()?;
    validation::required("firebase_uid", &req.firebase_uid)?;

    #[allow(deprecated)]
    let user = accounts
        .register_unverified(UnverifiedRegistration {
            name: &req.name,
            email: &req.email,
            subject: req.firebase_uid.trim(),
        })
        .await?;
    Ok(UserResponse { user })
}
