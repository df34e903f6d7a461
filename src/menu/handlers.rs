use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::{Date, Duration};
use tracing::instrument;

use super::dto::{GenerateRequest, ManualMealDto, ProposalRequest};
use super::plan::{ManualMeal, PlanRequest};
use super::repo::{self, Menu};
use super::services;
use crate::dates::{parse_iso_date, today};
use crate::llm::{complete_json_with_retry, ChatMessage, ChatOptions, LlmError};
use crate::recipes::MealType;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/menus", get(list_menus))
        .route("/menus/generate", post(generate_menus))
        .route("/menus/proposals", post(propose_menus))
}

#[derive(Debug, Deserialize)]
struct MenusQuery {
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    source: &'static str,
    menus: Vec<Menu>,
}

#[instrument(skip(state))]
async fn list_menus(
    State(state): State<AppState>,
    Query(query): Query<MenusQuery>,
) -> Result<Json<Vec<Menu>>, (StatusCode, String)> {
    let from = query
        .start
        .as_deref()
        .and_then(parse_iso_date)
        .unwrap_or_else(today);
    let to = query
        .end
        .as_deref()
        .and_then(parse_iso_date)
        .unwrap_or(from + Duration::days(6));
    let menus = repo::list_range(&state.db, from, to).await.map_err(internal)?;
    Ok(Json(menus))
}

#[instrument(skip(state, payload))]
async fn generate_menus(
    State(state): State<AppState>,
    Json(mut payload): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, String)> {
    let request = PlanRequest {
        days: payload.days(),
        meal_types: payload.meal_types(),
        manual: payload.manual_plan(),
    };
    let result = services::generate(&state, request).await.map_err(internal)?;
    Ok(Json(GenerateResponse {
        source: result.source.as_str(),
        menus: result.menus,
    }))
}

/// Asks the model for a multi-day plan, then runs the regular allocator over
/// the proposed meals so stock accounting and links work the same as for an
/// auto-generated plan.
#[instrument(skip(state, payload))]
async fn propose_menus(
    State(state): State<AppState>,
    Json(payload): Json<ProposalRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, String)> {
    let days = payload.days();
    let meal_types = payload.meal_types();

    let messages = proposal_prompt(&payload, &days, &meal_types);
    let value = complete_json_with_retry(state.llm.as_ref(), &messages, ChatOptions::default())
        .await
        .map_err(llm_error)?;

    let plan = sanitize_proposal(value, &days, &meal_types);
    if plan.is_empty() {
        return Err((
            StatusCode::BAD_GATEWAY,
            "Le modèle n'a proposé aucun repas exploitable.".to_string(),
        ));
    }

    let request = PlanRequest {
        days,
        meal_types,
        manual: Some(plan),
    };
    let result = services::generate(&state, request).await.map_err(internal)?;
    Ok(Json(GenerateResponse {
        source: result.source.as_str(),
        menus: result.menus,
    }))
}

fn proposal_prompt(
    payload: &ProposalRequest,
    days: &[Date],
    meal_types: &[MealType],
) -> Vec<ChatMessage> {
    let dates: Vec<String> = days
        .iter()
        .map(|d| {
            crate::dates::format_iso_date(*d)
        })
        .collect();
    let meals: Vec<&str> = meal_types.iter().map(|m| m.french_name()).collect();

    let mut constraints = String::new();
    if let Some(preferences) = payload.preferences.as_deref().filter(|s| !s.trim().is_empty()) {
        constraints.push_str(&format!("Préférences de la famille: {preferences}.\n"));
    }
    if let Some(restrictions) = payload.restrictions.as_deref().filter(|s| !s.trim().is_empty()) {
        constraints.push_str(&format!(
            "Restrictions alimentaires à respecter impérativement: {restrictions}.\n"
        ));
    }

    vec![
        ChatMessage::system(
            "Tu es un assistant culinaire pour une famille française. Tu proposes des repas \
             simples, équilibrés et de saison, adaptés aux enfants. Tu réponds uniquement avec \
             un objet JSON valide, sans texte autour.",
        ),
        ChatMessage::user(format!(
            "Propose un plan de repas pour ces dates: {dates}.\n\
             Types de repas à couvrir chaque jour: {meals}.\n\
             {constraints}\
             Réponds avec exactement cette structure JSON:\n\
             {{\"plan\": {{\"AAAA-MM-JJ\": [{{\"mealType\": \"lunch|dinner|breakfast|snack\", \
             \"title\": \"...\", \"description\": \"...\", \
             \"ingredients\": [{{\"name\": \"...\", \"quantity\": 0, \"unit\": \"g|ml|pcs\"}}], \
             \"suitableForToddler\": true, \"prepTimeMinutes\": 0, \"cookTimeMinutes\": 0}}]}}}}\n\
             Les quantités sont prévues pour 4 adultes. Limite chaque repas à 5 ingrédients \
             principaux.",
            dates = dates.join(", "),
            meals = meals.join(", "),
        )),
    ]
}

/// Keeps only meals on requested dates with requested meal types; everything
/// else the model hallucinated is dropped.
fn sanitize_proposal(
    value: serde_json::Value,
    days: &[Date],
    meal_types: &[MealType],
) -> BTreeMap<Date, Vec<ManualMeal>> {
    let raw: BTreeMap<String, Vec<ManualMealDto>> = value
        .get("plan")
        .cloned()
        .and_then(|plan| serde_json::from_value(plan).ok())
        .unwrap_or_default();

    let mut plan = BTreeMap::new();
    for (key, meals) in raw {
        let Some(date) = parse_iso_date(&key) else {
            continue;
        };
        if !days.contains(&date) {
            continue;
        }
        let kept: Vec<ManualMeal> = meals
            .into_iter()
            .map(ManualMealDto::into_meal)
            .filter(|meal| meal_types.contains(&meal.meal_type))
            .filter(|meal| meal.title.as_deref().is_some_and(|t| !t.trim().is_empty()))
            .collect();
        if !kept.is_empty() {
            plan.insert(date, kept);
        }
    }
    plan
}

fn llm_error(e: LlmError) -> (StatusCode, String) {
    let status = match e {
        LlmError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, e.to_string())
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    #[test]
    fn proposal_keeps_only_requested_dates_and_meals() {
        let value = json!({
            "plan": {
                "2024-05-06": [
                    {"mealType": "lunch", "title": "Gratin de courgettes"},
                    {"mealType": "snack", "title": "Compote"}
                ],
                "2024-05-20": [
                    {"mealType": "lunch", "title": "Hors plage"}
                ]
            }
        });
        let plan = sanitize_proposal(
            value,
            &[date!(2024 - 05 - 06)],
            &[MealType::Lunch, MealType::Dinner],
        );
        assert_eq!(plan.len(), 1);
        let meals = &plan[&date!(2024 - 05 - 06)];
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].title.as_deref(), Some("Gratin de courgettes"));
    }

    #[test]
    fn proposal_without_plan_key_is_empty() {
        let plan = sanitize_proposal(json!({"jours": []}), &[date!(2024 - 05 - 06)], &[MealType::Lunch]);
        assert!(plan.is_empty());
    }

    #[test]
    fn untitled_meals_are_dropped() {
        let value = json!({
            "plan": {"2024-05-06": [{"mealType": "lunch", "title": "  "}]}
        });
        let plan = sanitize_proposal(value, &[date!(2024 - 05 - 06)], &[MealType::Lunch]);
        assert!(plan.is_empty());
    }
}
