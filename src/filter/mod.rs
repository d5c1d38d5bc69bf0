//! Client-side style filtering and sorting of the cached recipe list.

use serde::Deserialize;

use crate::models::Recipe;

/// Size of the unfiltered "Popular" view.
pub const POPULAR_LIMIT: usize = 10;

/// User-chosen predicates over a recipe list.
///
/// All predicates are conjunctive; the multi-category predicate matches a
/// recipe carrying any of the selected categories.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeFilter {
    /// Case-insensitive substring over title, description and ingredients.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub max_difficulty: Option<i32>,
    /// Upper bound on cooking time in minutes.
    #[serde(default)]
    pub max_time: Option<i64>,
    /// Single category chip. Absent means the "Popular" view.
    #[serde(default)]
    pub category: Option<String>,
    /// Multi-select categories, comma-separated on the query string.
    #[serde(default, deserialize_with = "comma_separated")]
    pub categories: Vec<String>,
    /// Only recipes authored by the current user.
    #[serde(default)]
    pub mine: bool,
    /// Lift the top-N cut of the unfiltered "Popular" view.
    #[serde(default)]
    pub show_all: bool,
}

fn comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect())
}

impl RecipeFilter {
    fn search_text(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    fn category_chip(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("popular"))
    }

    /// True when any predicate other than the chip or "mine" is set.
    pub fn has_refinements(&self) -> bool {
        self.search_text().is_some()
            || self.max_difficulty.is_some()
            || self.max_time.is_some()
            || !self.categories.is_empty()
    }

    /// Apply the filter to a recipe list.
    ///
    /// `current_user` is only consulted for the "mine" predicate, which is
    /// ignored when nobody is signed in. Without a category chip this is the
    /// "Popular" view: results are ranked by favorites and, unless refined,
    /// cut to the top [`POPULAR_LIMIT`].
    pub fn apply(&self, recipes: &[Recipe], current_user: Option<&str>) -> Vec<Recipe> {
        let mut filtered = self.apply_predicates(recipes, current_user);

        if self.category_chip().is_none() {
            // Stable sort keeps store order among equally popular recipes.
            filtered.sort_by(|a, b| b.favorite_counter.cmp(&a.favorite_counter));
            if !self.has_refinements() && !self.show_all {
                filtered.truncate(POPULAR_LIMIT);
            }
        }

        filtered
    }

    /// Keep the recipes matching every predicate, in their original order.
    pub fn apply_predicates(
        &self,
        recipes: &[Recipe],
        current_user: Option<&str>,
    ) -> Vec<Recipe> {
        let search = self.search_text();
        let chip = self.category_chip();
        let selected: Vec<String> = self.categories.iter().map(|c| c.to_lowercase()).collect();

        recipes
            .iter()
            .filter(|recipe| match (self.mine, current_user) {
                (true, Some(uid)) => recipe.author_id == uid,
                _ => true,
            })
            .filter(|recipe| chip.map_or(true, |c| recipe.has_category(c)))
            .filter(|recipe| search.as_deref().map_or(true, |q| matches_text(recipe, q)))
            .filter(|recipe| self.max_difficulty.map_or(true, |d| recipe.difficulty <= d))
            .filter(|recipe| self.max_time.map_or(true, |t| recipe.time_minutes() <= t))
            .filter(|recipe| {
                selected.is_empty()
                    || recipe
                        .categories
                        .iter()
                        .any(|c| selected.contains(&c.to_lowercase()))
            })
            .cloned()
            .collect()
    }
}

/// `query` must already be lowercase.
fn matches_text(recipe: &Recipe, query: &str) -> bool {
    recipe.title.to_lowercase().contains(query)
        || recipe.description.to_lowercase().contains(query)
        || recipe
            .ingredients
            .iter()
            .any(|i| i.display().to_lowercase().contains(query))
}
