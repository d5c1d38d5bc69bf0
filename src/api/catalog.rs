//! Reference catalog endpoints: ingredient and category pickers, calorie
//! calculator.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::models::{CalorieReport, CalorieRequest, IngredientOption};
use crate::AppState;

/// Picker query; an empty `q` lists everything.
#[derive(Debug, Default, Deserialize)]
pub struct PickerQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /api/catalog/ingredients - Ingredients matching `q` with their units.
pub async fn search_ingredients(
    State(state): State<AppState>,
    Query(query): Query<PickerQuery>,
) -> ApiResult<Vec<IngredientOption>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let options = state
        .catalog
        .search_ingredients(&query.q)
        .into_iter()
        .map(IngredientOption::from)
        .collect();

    success(options, revision_id)
}

/// GET /api/catalog/categories - Categories matching `q`.
pub async fn search_categories(
    State(state): State<AppState>,
    Query(query): Query<PickerQuery>,
) -> ApiResult<Vec<String>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let categories = state
        .catalog
        .search_categories(&query.q)
        .into_iter()
        .map(str::to_string)
        .collect();

    success(categories, revision_id)
}

/// POST /api/catalog/calories - Per-line and total calories.
pub async fn calculate_calories(
    State(state): State<AppState>,
    Json(request): Json<CalorieRequest>,
) -> ApiResult<CalorieReport> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let ingredients = request.ingredients.into_iter().map(Into::into).collect();

    success(state.catalog.calorie_report(ingredients), revision_id)
}
