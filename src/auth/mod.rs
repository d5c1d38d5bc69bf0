//! Authentication: the optional app-key gate, password accounts and
//! bearer-token sessions.
//!
//! The app key is compared in constant time to mitigate timing attacks.

use std::convert::Infallible;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{AuthSession, LoginRequest, RegisterRequest, User};
use crate::AppState;

/// Header name for the application key.
pub const APP_KEY_HEADER: &str = "x-app-key";

pub const MIN_PASSWORD_LEN: usize = 6;

const BAD_CREDENTIALS: &str = "Invalid email or password";

/// App-key layer function that takes the expected key as a parameter.
pub async fn app_key_layer(expected_key: Option<String>, request: Request, next: Next) -> Response {
    // If no key is configured, allow all requests (dev mode)
    let Some(expected) = expected_key else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(APP_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    match provided {
        Some(provided_key) if constant_time_compare(&provided_key, &expected) => {
            next.run(request).await
        }
        Some(_) => AppError::Unauthorized("Invalid app key".to_string()).into_response(),
        None => AppError::Unauthorized("Missing app key".to_string()).into_response(),
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// The signed-in user, attached to the request by [`session_layer`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Resolve `Authorization: Bearer <token>` to a [`CurrentUser`] extension.
///
/// Requests without a valid session pass through anonymously; handlers that
/// need identity extract `CurrentUser` and reject them there.
pub async fn session_layer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(&request).map(str::to_string) {
        match state.repo.user_for_session(&token).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(CurrentUser { user, token });
            }
            Ok(None) => tracing::debug!("Unknown session token"),
            Err(e) => return e.into_response(),
        }
    }

    next.run(request).await
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Sign in required".to_string()))
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<CurrentUser>().cloned())
    }
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);

    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

pub fn verify_password(
    password: &str,
    password_hash: &str,
) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(password_hash)?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn validate_registration(req: &RegisterRequest) -> Result<(), AppError> {
    if req.email.trim().is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }
    if req.username.trim().is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    if req.password.trim().is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Create an account and open a session for it.
pub async fn register(repo: &Repository, req: RegisterRequest) -> Result<AuthSession, AppError> {
    validate_registration(&req)?;

    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))??;

    let user = repo
        .create_user(req.email.trim(), &password_hash, req.username.trim())
        .await?;
    let token = repo.create_session(&user.id).await?;

    tracing::info!("Registered user {}", user.id);
    Ok(AuthSession { token, user })
}

/// Verify credentials and open a session.
pub async fn login(repo: &Repository, req: LoginRequest) -> Result<AuthSession, AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let Some((user, password_hash)) = repo.find_credentials(req.email.trim()).await? else {
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
    };

    let password = req.password;
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))??;

    if !valid {
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    let token = repo.create_session(&user.id).await?;
    Ok(AuthSession { token, user })
}

/// Close a session. Closing an unknown token is not an error.
pub async fn logout(repo: &Repository, token: &str) -> Result<(), AppError> {
    if !repo.delete_session(token).await? {
        tracing::debug!("Logout for a session that was already closed");
    }
    Ok(())
}
