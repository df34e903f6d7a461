use serde::Deserialize;
use std::collections::BTreeMap;
use time::Date;
use uuid::Uuid;

use super::plan::ManualMeal;
use super::repo::parse_meal_types;
use crate::dates::{parse_iso_date, today, week_days};
use crate::recipes::{IngredientSpec, MealType};

fn default_scope() -> String {
    "week".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub start_date: Option<String>,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default)]
    pub meal_types: Vec<String>,
    /// Caller-supplied plan keyed by ISO date; covered slots are taken as-is
    /// instead of drawing recipes.
    pub plan: Option<BTreeMap<String, Vec<ManualMealDto>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualMealDto {
    #[serde(default, alias = "meal")]
    pub meal_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientSpec>,
    pub suitable_for: Option<Vec<Uuid>>,
    pub suitable_for_toddler: Option<bool>,
    pub portion_multiplier: Option<f64>,
    pub prep_time_minutes: Option<f64>,
    pub cook_time_minutes: Option<f64>,
    pub recipe_url: Option<String>,
}

impl ManualMealDto {
    pub fn into_meal(self) -> ManualMeal {
        ManualMeal {
            meal_type: self
                .meal_type
                .as_deref()
                .map(MealType::normalize)
                .unwrap_or(MealType::Lunch),
            title: self.title,
            description: self.description,
            ingredients: self.ingredients,
            suitable_for: self.suitable_for,
            suitable_for_toddler: self.suitable_for_toddler,
            portion_multiplier: self.portion_multiplier,
            prep_time_minutes: self.prep_time_minutes,
            cook_time_minutes: self.cook_time_minutes,
            recipe_url: self.recipe_url,
        }
    }
}

impl GenerateRequest {
    pub fn start(&self) -> Date {
        self.start_date
            .as_deref()
            .and_then(parse_iso_date)
            .unwrap_or_else(today)
    }

    pub fn days(&self) -> Vec<Date> {
        let start = self.start();
        if self.scope.eq_ignore_ascii_case("today") {
            vec![start]
        } else {
            week_days(start)
        }
    }

    pub fn meal_types(&self) -> Vec<MealType> {
        parse_meal_types(&self.meal_types)
    }

    /// Invalid date keys are dropped; an empty result means no manual plan.
    pub fn manual_plan(&mut self) -> Option<BTreeMap<Date, Vec<ManualMeal>>> {
        let plan = self.plan.take()?;
        let mut converted = BTreeMap::new();
        for (key, meals) in plan {
            let Some(date) = parse_iso_date(&key) else {
                continue;
            };
            converted.insert(date, meals.into_iter().map(ManualMealDto::into_meal).collect());
        }
        (!converted.is_empty()).then_some(converted)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalRequest {
    pub start_date: Option<String>,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default)]
    pub meal_types: Vec<String>,
    pub preferences: Option<String>,
    pub restrictions: Option<String>,
}

impl ProposalRequest {
    pub fn days(&self) -> Vec<Date> {
        let start = self
            .start_date
            .as_deref()
            .and_then(parse_iso_date)
            .unwrap_or_else(today);
        if self.scope.eq_ignore_ascii_case("today") {
            vec![start]
        } else {
            week_days(start)
        }
    }

    pub fn meal_types(&self) -> Vec<MealType> {
        parse_meal_types(&self.meal_types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn generate_request_defaults_to_a_week() {
        let mut request: GenerateRequest =
            serde_json::from_str(r#"{"startDate": "2024-05-06"}"#).unwrap();
        assert_eq!(request.days().len(), 7);
        assert_eq!(request.days()[0], date!(2024 - 05 - 06));
        assert_eq!(request.meal_types(), MealType::DEFAULT_SET.to_vec());
        assert!(request.manual_plan().is_none());
    }

    #[test]
    fn today_scope_is_a_single_day() {
        let request: GenerateRequest =
            serde_json::from_str(r#"{"startDate": "2024-05-06", "scope": "today"}"#).unwrap();
        assert_eq!(request.days(), vec![date!(2024 - 05 - 06)]);
    }

    #[test]
    fn manual_plan_drops_unparsable_dates() {
        let mut request: GenerateRequest = serde_json::from_str(
            r#"{
                "plan": {
                    "2024-05-06": [{"mealType": "dîner", "title": "Gratin"}],
                    "pas-une-date": [{"title": "Perdu"}]
                }
            }"#,
        )
        .unwrap();
        let plan = request.manual_plan().unwrap();
        assert_eq!(plan.len(), 1);
        let meals = &plan[&date!(2024 - 05 - 06)];
        assert_eq!(meals[0].meal_type, MealType::Dinner);
        assert_eq!(meals[0].title.as_deref(), Some("Gratin"));
    }

    #[test]
    fn meal_type_labels_are_normalized_and_deduped() {
        let request: GenerateRequest = serde_json::from_str(
            r#"{"mealTypes": ["Déjeuner", "lunch", "goûter"]}"#,
        )
        .unwrap();
        assert_eq!(
            request.meal_types(),
            vec![MealType::Lunch, MealType::Snack]
        );
    }
}
