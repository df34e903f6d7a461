//! Recipe templates: stored pool, built-in fallbacks and the shared meal
//! vocabulary (meal types, ingredient specs).

pub mod repo;

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const DEFAULT_SET: [MealType; 3] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner];

    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    /// French display name used in LLM prompts.
    pub fn french_name(self) -> &'static str {
        match self {
            MealType::Breakfast => "petit-déjeuner",
            MealType::Lunch => "déjeuner",
            MealType::Dinner => "dîner",
            MealType::Snack => "goûter",
        }
    }

    /// Accepts English identifiers and the French labels users (and the
    /// model) produce; anything unrecognized lands on lunch.
    pub fn normalize(label: &str) -> Self {
        match crate::text::normalize_label(label).as_str() {
            "breakfast" | "petit dejeuner" | "petit dej" | "matin" => MealType::Breakfast,
            "dinner" | "diner" | "soir" => MealType::Dinner,
            "snack" | "gouter" | "collation" => MealType::Snack,
            _ => MealType::Lunch,
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ingredient line of a recipe, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientSpec {
    #[serde(alias = "product", alias = "title")]
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub meal_type: MealType,
    pub description: Option<String>,
    pub ingredients: Vec<IngredientSpec>,
    pub suitable_for_toddler: bool,
    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    pub recipe_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_french_meal_labels() {
        assert_eq!(MealType::normalize("Petit-Déjeuner"), MealType::Breakfast);
        assert_eq!(MealType::normalize("dîner"), MealType::Dinner);
        assert_eq!(MealType::normalize("goûter"), MealType::Snack);
        assert_eq!(MealType::normalize("midi"), MealType::Lunch);
        assert_eq!(MealType::normalize("???"), MealType::Lunch);
    }

    #[test]
    fn ingredient_spec_accepts_product_alias() {
        let spec: IngredientSpec =
            serde_json::from_str(r#"{"product": "Pâtes", "quantity": 600, "unit": "g"}"#).unwrap();
        assert_eq!(spec.name, "Pâtes");
        assert_eq!(spec.quantity, Some(600.0));
    }
}
