//! Account API endpoints: register, login, logout.

use axum::{extract::State, Json};

use super::{error, success, ApiResult};
use crate::auth::{self, CurrentUser};
use crate::models::{AuthSession, LoginRequest, RegisterRequest};
use crate::AppState;

/// POST /api/auth/register - Create an account and sign in.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<AuthSession> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match auth::register(&state.repo, request).await {
        Ok(session) => success(session, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/auth/login - Sign in with email and password.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<AuthSession> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match auth::login(&state.repo, request).await {
        Ok(session) => {
            state.recipes.refresh_favorites(&session.user.id).await;
            success(session, revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/auth/logout - Close the current session.
pub async fn logout(State(state): State<AppState>, current: CurrentUser) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match auth::logout(&state.repo, &current.token).await {
        Ok(()) => {
            state.recipes.forget_favorites(&current.user.id).await;
            success((), revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}
