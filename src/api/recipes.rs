//! Recipe API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::auth::CurrentUser;
use crate::catalog::Catalog;
use crate::errors::AppError;
use crate::filter::RecipeFilter;
use crate::models::{
    FavoriteRequest, FavoriteStatus, Ingredient, Recipe, RecipeDraft, RecipeRequest,
    MAX_CATEGORIES, MAX_DIFFICULTY, MIN_DIFFICULTY,
};
use crate::AppState;

/// Check an upload or edit and turn it into a draft.
///
/// Calories are computed here from the catalog; the image URL is carried
/// through as given (possibly empty) and resolved by the caller.
pub fn validate_recipe(catalog: &Catalog, request: RecipeRequest) -> Result<RecipeDraft, AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if request.description.trim().is_empty() {
        return Err(AppError::Validation("Description is required".to_string()));
    }
    if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&request.difficulty) {
        return Err(AppError::Validation(format!(
            "Difficulty must be between {} and {}",
            MIN_DIFFICULTY, MAX_DIFFICULTY
        )));
    }

    let mut categories: Vec<String> = Vec::new();
    for raw in &request.categories {
        let name = raw.trim();
        if name.is_empty() {
            continue;
        }
        let name = if catalog.categories().is_empty() {
            name
        } else {
            catalog
                .category(name)
                .ok_or_else(|| AppError::Validation(format!("Unknown category: {}", name)))?
        };
        let key = name.to_lowercase();
        if !categories.iter().any(|c| c.to_lowercase() == key) {
            categories.push(name.to_string());
        }
    }
    if categories.is_empty() {
        return Err(AppError::Validation(
            "At least one category is required".to_string(),
        ));
    }
    if categories.len() > MAX_CATEGORIES {
        return Err(AppError::Validation(format!(
            "At most {} categories are allowed",
            MAX_CATEGORIES
        )));
    }

    let ingredients: Vec<Ingredient> = request.ingredients.into_iter().map(Into::into).collect();
    if let Some(bad) = ingredients.iter().find(|i| !i.is_complete()) {
        return Err(AppError::Validation(format!(
            "Ingredient {:?} needs a name, a positive amount and a unit",
            bad.display()
        )));
    }

    let directions = request
        .directions
        .into_iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();

    Ok(RecipeDraft {
        title: request.title.trim().to_string(),
        description: request.description.trim().to_string(),
        calories: catalog.total_calories(&ingredients),
        ingredients,
        categories,
        image_url: request
            .image_url
            .map(|url| url.trim().to_string())
            .unwrap_or_default(),
        difficulty: request.difficulty,
        time: request.time.trim().to_string(),
        directions,
    })
}

/// GET /api/recipes - Filtered view of the live recipe list.
pub async fn list_recipes(
    State(state): State<AppState>,
    current: Option<CurrentUser>,
    Query(filter): Query<RecipeFilter>,
) -> ApiResult<Vec<Recipe>> {
    let snapshot = state.recipes.recipes();
    let user_id = current.as_ref().map(|c| c.user.id.as_str());

    success(filter.apply(&snapshot.recipes, user_id), snapshot.revision_id)
}

/// GET /api/recipes/{id} - Get a single recipe.
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Recipe> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_recipe(&id).await {
        Ok(Some(recipe)) => success(recipe, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Recipe {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// Load a recipe and check that `user_id` wrote it.
async fn owned_recipe(state: &AppState, id: &str, user_id: &str) -> Result<Recipe, AppError> {
    let recipe = state
        .repo
        .get_recipe(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", id)))?;

    if recipe.author_id != user_id {
        return Err(AppError::Forbidden(
            "Only the author can change this recipe".to_string(),
        ));
    }
    Ok(recipe)
}

/// POST /api/recipes - Upload a new recipe.
pub async fn create_recipe(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<RecipeRequest>,
) -> ApiResult<Recipe> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let mut draft = match validate_recipe(&state.catalog, request) {
        Ok(draft) => draft,
        Err(e) => return error(e, revision_id),
    };
    if draft.image_url.is_empty() {
        draft.image_url = state.photos.cover_for(&draft.title).await;
    }

    match state.repo.add_recipe(&current.user.id, &draft).await {
        Ok(recipe) => {
            tracing::info!("User {} uploaded recipe {}", current.user.id, recipe.id);
            let snapshot = state.recipes.refresh_recipes().await;
            success(recipe, snapshot.revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/recipes/{id} - Overwrite a recipe. Author only.
pub async fn update_recipe(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<RecipeRequest>,
) -> ApiResult<Recipe> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let existing = match owned_recipe(&state, &id, &current.user.id).await {
        Ok(recipe) => recipe,
        Err(e) => return error(e, revision_id),
    };
    let mut draft = match validate_recipe(&state.catalog, request) {
        Ok(draft) => draft,
        Err(e) => return error(e, revision_id),
    };
    if draft.image_url.is_empty() {
        draft.image_url = existing.image_url;
    }

    match state.repo.update_recipe(&id, &draft).await {
        Ok(recipe) => {
            let snapshot = state.recipes.refresh_recipes().await;
            success(recipe, snapshot.revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/recipes/{id} - Delete a recipe. Author only.
pub async fn delete_recipe(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Recipe> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = owned_recipe(&state, &id, &current.user.id).await {
        return error(e, revision_id);
    }

    match state.repo.delete_recipe(&id).await {
        Ok(recipe) => {
            tracing::info!("User {} deleted recipe {}", current.user.id, id);
            // Favorite markers went with the recipe.
            state.recipes.clear_favorites().await;
            let snapshot = state.recipes.refresh_recipes().await;
            success(recipe, snapshot.revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/recipes/{id}/favorite - Whether the signed-in user marked it.
pub async fn get_favorite(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<FavoriteStatus> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let recipe = match state.repo.get_recipe(&id).await {
        Ok(Some(recipe)) => recipe,
        Ok(None) => {
            return error(
                AppError::NotFound(format!("Recipe {} not found", id)),
                revision_id,
            )
        }
        Err(e) => return error(e, revision_id),
    };

    success(
        FavoriteStatus {
            favorite: state.recipes.is_favorite(&current.user.id, &id).await,
            recipe_id: id,
            favorite_counter: recipe.favorite_counter,
        },
        revision_id,
    )
}

/// PUT /api/recipes/{id}/favorite - Mark or unmark a favorite.
pub async fn set_favorite(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<FavoriteRequest>,
) -> ApiResult<FavoriteStatus> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state
        .repo
        .set_favorite(&current.user.id, &id, request.favorite)
        .await
    {
        Ok(favorite_counter) => {
            state.recipes.refresh_favorites(&current.user.id).await;
            let snapshot = state.recipes.refresh_recipes().await;
            success(
                FavoriteStatus {
                    recipe_id: id,
                    favorite: request.favorite,
                    favorite_counter,
                },
                snapshot.revision_id,
            )
        }
        Err(e) => error(e, revision_id),
    }
}
