//! Endpoints about the signed-in user.

use axum::extract::{Query, State};

use super::{error, success, ApiResult};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::filter::RecipeFilter;
use crate::models::{Recipe, UserProfile};
use crate::AppState;

/// GET /api/me - Profile of the signed-in user.
pub async fn get_me(State(state): State<AppState>, current: CurrentUser) -> ApiResult<UserProfile> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_profile(&current.user.id).await {
        Ok(Some(profile)) => success(profile, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("User {} not found", current.user.id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/me/favorites - IDs of the signed-in user's favorites.
pub async fn list_favorite_ids(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Vec<String>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let ids = state.recipes.favorites(&current.user.id).await;

    success(ids.to_vec(), revision_id)
}

/// GET /api/me/favorites/recipes - Filtered view of the favorite recipes.
///
/// Favorites keep the live list's order and are never ranked or cut.
pub async fn list_favorite_recipes(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(filter): Query<RecipeFilter>,
) -> ApiResult<Vec<Recipe>> {
    let snapshot = state.recipes.recipes();
    let ids = state.recipes.favorites(&current.user.id).await;

    let favorites: Vec<Recipe> = snapshot
        .recipes
        .iter()
        .filter(|recipe| ids.contains(&recipe.id))
        .cloned()
        .collect();

    success(
        filter.apply_predicates(&favorites, Some(current.user.id.as_str())),
        snapshot.revision_id,
    )
}
