//! Recipe model and request bodies.

use serde::{Deserialize, Serialize};

use super::{Ingredient, IngredientInput};

/// Maximum number of category tags on one recipe.
pub const MAX_CATEGORIES: usize = 5;

/// Lowest and highest difficulty a recipe may carry.
pub const MIN_DIFFICULTY: i32 = 1;
pub const MAX_DIFFICULTY: i32 = 5;

/// A shared recipe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub image_url: String,
    pub author_id: String,
    #[serde(default)]
    pub calories: i64,
    pub difficulty: i32,
    /// Free-text cooking time, read as whole minutes when filtering.
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub favorite_counter: i64,
    #[serde(default)]
    pub directions: Vec<String>,
    #[serde(default)]
    pub updated_at: String,
}

impl Recipe {
    /// Cooking time in minutes.
    ///
    /// Only a plain 32-bit integer counts; padded, fractional, out-of-range
    /// or otherwise non-numeric text is zero.
    pub fn time_minutes(&self) -> i64 {
        self.time.parse::<i32>().map_or(0, i64::from)
    }

    pub fn has_category(&self, category: &str) -> bool {
        let wanted = category.to_lowercase();
        self.categories.iter().any(|c| c.to_lowercase() == wanted)
    }
}

/// Recipe content as written by its author on upload or edit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<IngredientInput>,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Cover image; looked up from the photo service on upload when absent.
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_difficulty")]
    pub difficulty: i32,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub directions: Vec<String>,
}

fn default_difficulty() -> i32 {
    MIN_DIFFICULTY
}

/// Validated recipe content ready to be written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub categories: Vec<String>,
    pub image_url: String,
    pub calories: i64,
    pub difficulty: i32,
    pub time: String,
    pub directions: Vec<String>,
}

/// Request body for marking or unmarking a favorite.
#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteRequest {
    pub favorite: bool,
}

/// Result of a favorite toggle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStatus {
    pub recipe_id: String,
    pub favorite: bool,
    pub favorite_counter: i64,
}
