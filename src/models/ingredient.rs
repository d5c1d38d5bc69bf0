//! Ingredient models: recipe ingredient lines and calorie reference entries.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Coefficient value marking a unit as not offered for an ingredient.
pub const UNSUPPORTED_COEFFICIENT: f64 = -1.0;

/// Measurement unit for an ingredient amount.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    G,
    Piece,
    Tbsp,
    Tsp,
    Ml,
    Cup,
}

impl Unit {
    /// All units in reference-table column order.
    pub const ALL: [Unit; 6] = [
        Unit::G,
        Unit::Piece,
        Unit::Tbsp,
        Unit::Tsp,
        Unit::Ml,
        Unit::Cup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::G => "g",
            Unit::Piece => "piece",
            Unit::Tbsp => "tbsp",
            Unit::Tsp => "tsp",
            Unit::Ml => "ml",
            Unit::Cup => "cup",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "g" => Some(Unit::G),
            "piece" => Some(Unit::Piece),
            "tbsp" => Some(Unit::Tbsp),
            "tsp" => Some(Unit::Tsp),
            "ml" => Some(Unit::Ml),
            "cup" => Some(Unit::Cup),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ingredient line of a recipe.
///
/// Amount and unit are optional only so that legacy display strings which
/// fail to parse can still be carried as a bare name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
}

fn display_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(.*) \((.+) (.+)\)$").ok())
        .as_ref()
}

impl Ingredient {
    pub fn new(name: impl Into<String>, amount: f64, unit: Unit) -> Self {
        Self {
            name: name.into(),
            amount: Some(amount),
            unit: Some(unit),
        }
    }

    /// Parse a `"<name> (<amount> <unit>)"` display string.
    ///
    /// Anything that does not match the pattern, or whose amount or unit does
    /// not parse, becomes a name-only ingredient holding the whole string.
    pub fn parse_display(s: &str) -> Self {
        let parsed = display_pattern()
            .and_then(|re| re.captures(s))
            .and_then(|caps| {
                let amount = caps.get(2)?.as_str().trim().parse::<f64>().ok()?;
                let unit = Unit::parse(caps.get(3)?.as_str())?;
                Some(Self::new(caps.get(1)?.as_str(), amount, unit))
            });

        parsed.unwrap_or_else(|| Self {
            name: s.to_string(),
            amount: None,
            unit: None,
        })
    }

    /// The display form used in search matching and list rendering.
    pub fn display(&self) -> String {
        self.to_string()
    }

    /// True when the line has a non-blank name, a positive amount and a unit.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && self.amount.is_some_and(|a| a.is_finite() && a > 0.0)
            && self.unit.is_some()
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.amount, self.unit) {
            (Some(amount), Some(unit)) => write!(f, "{} ({} {})", self.name, amount, unit),
            _ => f.write_str(&self.name),
        }
    }
}

/// Ingredient as accepted on the wire: structured, or a legacy display string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IngredientInput {
    Structured(Ingredient),
    Display(String),
}

impl From<IngredientInput> for Ingredient {
    fn from(input: IngredientInput) -> Self {
        match input {
            IngredientInput::Structured(ingredient) => ingredient,
            IngredientInput::Display(s) => Ingredient::parse_display(&s),
        }
    }
}

/// Calorie reference entry for one ingredient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IngredientInfo {
    pub name: String,
    pub calories_per_g: f64,
    pub calories_per_piece: f64,
    pub calories_per_tbsp: f64,
    pub calories_per_tsp: f64,
    pub calories_per_ml: f64,
    pub calories_per_cup: f64,
}

impl IngredientInfo {
    /// Raw coefficient for a unit, including the unsupported sentinel.
    pub fn raw_coefficient(&self, unit: Unit) -> f64 {
        match unit {
            Unit::G => self.calories_per_g,
            Unit::Piece => self.calories_per_piece,
            Unit::Tbsp => self.calories_per_tbsp,
            Unit::Tsp => self.calories_per_tsp,
            Unit::Ml => self.calories_per_ml,
            Unit::Cup => self.calories_per_cup,
        }
    }

    /// Calories per unit, or `None` when the unit is not offered.
    pub fn coefficient(&self, unit: Unit) -> Option<f64> {
        let value = self.raw_coefficient(unit);
        (value != UNSUPPORTED_COEFFICIENT).then_some(value)
    }

    pub fn supported_units(&self) -> Vec<Unit> {
        Unit::ALL
            .into_iter()
            .filter(|unit| self.coefficient(*unit).is_some())
            .collect()
    }
}

/// Reference entry plus the units it can be measured in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientOption {
    #[serde(flatten)]
    pub info: IngredientInfo,
    pub units: Vec<Unit>,
}

impl From<&IngredientInfo> for IngredientOption {
    fn from(info: &IngredientInfo) -> Self {
        Self {
            info: info.clone(),
            units: info.supported_units(),
        }
    }
}

/// Request body for a calorie calculation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalorieRequest {
    pub ingredients: Vec<IngredientInput>,
}

/// Calories for one ingredient line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalorieLine {
    pub ingredient: Ingredient,
    pub display: String,
    pub calories: f64,
}

/// Result of a calorie calculation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalorieReport {
    pub lines: Vec<CalorieLine>,
    pub total: i64,
}
