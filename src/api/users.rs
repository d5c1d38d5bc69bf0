//! Public user profile endpoint.

use axum::extract::{Path, State};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::UserProfile;
use crate::AppState;

/// GET /api/users/{id} - Public profile with recipe statistics.
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<UserProfile> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_profile(&id).await {
        Ok(Some(profile)) => success(profile, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("User {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}
