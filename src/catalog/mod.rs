//! Static reference data: the ingredient calorie table and the category list.
//!
//! Both files are read once at startup and never change afterwards.
//! `ingredients.txt` holds one `name|g|piece|tbsp|tsp|ml|cup` line per
//! ingredient; `categories.txt` holds one category per line.

use std::path::Path;

use crate::models::{
    CalorieLine, CalorieReport, Ingredient, IngredientInfo, Unit, UNSUPPORTED_COEFFICIENT,
};

pub const INGREDIENTS_FILE: &str = "ingredients.txt";
pub const CATEGORIES_FILE: &str = "categories.txt";

/// Parse one reference line. Lines without exactly seven fields are rejected;
/// a non-numeric coefficient becomes the unsupported sentinel.
pub fn parse_ingredient_line(line: &str) -> Option<IngredientInfo> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() != 7 {
        return None;
    }

    let coefficient =
        |field: &str| -> f64 { field.trim().parse().unwrap_or(UNSUPPORTED_COEFFICIENT) };

    Some(IngredientInfo {
        name: parts[0].trim().to_string(),
        calories_per_g: coefficient(parts[1]),
        calories_per_piece: coefficient(parts[2]),
        calories_per_tbsp: coefficient(parts[3]),
        calories_per_tsp: coefficient(parts[4]),
        calories_per_ml: coefficient(parts[5]),
        calories_per_cup: coefficient(parts[6]),
    })
}

/// In-memory reference catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    ingredients: Vec<IngredientInfo>,
    categories: Vec<String>,
}

impl Catalog {
    /// Build a catalog from the raw text of both reference files.
    pub fn from_sources(ingredients_text: &str, categories_text: &str) -> Self {
        let mut ingredients: Vec<IngredientInfo> = ingredients_text
            .lines()
            .filter_map(parse_ingredient_line)
            .filter(|info| !info.name.is_empty())
            .collect();
        ingredients.sort_by(|a, b| a.name.cmp(&b.name));

        let mut categories: Vec<String> = categories_text
            .lines()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        categories.sort_by_key(|c| c.to_lowercase());

        Self {
            ingredients,
            categories,
        }
    }

    /// Load both reference files from a directory.
    ///
    /// A missing or unreadable file leaves that part of the catalog empty.
    pub fn load(dir: &Path) -> Self {
        let read = |file: &str| {
            let path = dir.join(file);
            std::fs::read_to_string(&path).unwrap_or_else(|e| {
                tracing::warn!("Could not read {}: {}", path.display(), e);
                String::new()
            })
        };

        let ingredients_text = read(INGREDIENTS_FILE);
        let catalog = Self::from_sources(&ingredients_text, &read(CATEGORIES_FILE));

        let dropped = ingredients_text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .count()
            .saturating_sub(catalog.ingredients.len());
        if dropped > 0 {
            tracing::debug!("Dropped {} malformed ingredient lines", dropped);
        }

        catalog
    }

    pub fn ingredients(&self) -> &[IngredientInfo] {
        &self.ingredients
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Reference entry by name, ignoring case and surrounding whitespace.
    pub fn ingredient(&self, name: &str) -> Option<&IngredientInfo> {
        let wanted = name.trim().to_lowercase();
        self.ingredients
            .iter()
            .find(|info| info.name.to_lowercase() == wanted)
    }

    /// The catalog's spelling of a category, if it is listed.
    pub fn category(&self, name: &str) -> Option<&str> {
        let wanted = name.trim().to_lowercase();
        self.categories
            .iter()
            .find(|c| c.to_lowercase() == wanted)
            .map(String::as_str)
    }

    pub fn search_ingredients(&self, query: &str) -> Vec<&IngredientInfo> {
        let query = query.trim().to_lowercase();
        self.ingredients
            .iter()
            .filter(|info| info.name.to_lowercase().contains(&query))
            .collect()
    }

    pub fn search_categories(&self, query: &str) -> Vec<&str> {
        let query = query.trim().to_lowercase();
        self.categories
            .iter()
            .filter(|c| c.to_lowercase().contains(&query))
            .map(String::as_str)
            .collect()
    }

    /// Calories for `amount` of an ingredient; zero when the ingredient or
    /// unit is unknown, or the amount is not a finite positive number.
    pub fn calories_for(&self, name: &str, amount: f64, unit: Unit) -> f64 {
        if !(amount.is_finite() && amount > 0.0) {
            return 0.0;
        }
        self.ingredient(name)
            .and_then(|info| info.coefficient(unit))
            .map(|coefficient| amount * coefficient)
            .filter(|calories| calories.is_finite())
            .unwrap_or(0.0)
    }

    /// Calories for one recipe ingredient line.
    pub fn line_calories(&self, ingredient: &Ingredient) -> f64 {
        match (ingredient.amount, ingredient.unit) {
            (Some(amount), Some(unit)) => self.calories_for(&ingredient.name, amount, unit),
            _ => 0.0,
        }
    }

    /// Sum of line calories, truncated to whole calories. A sum too large to
    /// represent is zero.
    pub fn total_calories(&self, ingredients: &[Ingredient]) -> i64 {
        let total: f64 = ingredients.iter().map(|i| self.line_calories(i)).sum();
        if total.is_finite() && total < i64::MAX as f64 {
            total.trunc() as i64
        } else {
            0
        }
    }

    /// Per-line breakdown plus total.
    pub fn calorie_report(&self, ingredients: Vec<Ingredient>) -> CalorieReport {
        let total = self.total_calories(&ingredients);
        let lines = ingredients
            .into_iter()
            .map(|ingredient| CalorieLine {
                calories: self.line_calories(&ingredient),
                display: ingredient.display(),
                ingredient,
            })
            .collect();

        CalorieReport { lines, total }
    }
}
