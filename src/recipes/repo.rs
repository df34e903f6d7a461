use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

use super::{IngredientSpec, MealType, Recipe};

#[derive(Debug, FromRow)]
struct RecipeRow {
    id: Uuid,
    title: String,
    meal_type: String,
    description: Option<String>,
    ingredients: serde_json::Value,
    suitable_for_toddler: bool,
    prep_time_minutes: Option<i32>,
    cook_time_minutes: Option<i32>,
    recipe_url: Option<String>,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        let ingredients = parse_ingredients(&row.id.to_string(), row.ingredients);
        Self {
            id: row.id.to_string(),
            title: row.title,
            meal_type: MealType::normalize(&row.meal_type),
            description: row.description,
            ingredients,
            suitable_for_toddler: row.suitable_for_toddler,
            prep_time_minutes: row.prep_time_minutes,
            cook_time_minutes: row.cook_time_minutes,
            recipe_url: row.recipe_url,
        }
    }
}

/// Ingredients are stored as JSON; some rows carry a JSON-encoded string
/// instead of an array. Both decode, anything else yields an empty list.
fn parse_ingredients(recipe_id: &str, value: serde_json::Value) -> Vec<IngredientSpec> {
    let value = match value {
        serde_json::Value::String(inner) => match serde_json::from_str(&inner) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(recipe_id, error = %e, "unparsable recipe ingredients");
                return Vec::new();
            }
        },
        other => other,
    };
    match serde_json::from_value::<Vec<IngredientSpec>>(value) {
        Ok(list) => list,
        Err(e) => {
            warn!(recipe_id, error = %e, "unexpected recipe ingredient shape");
            Vec::new()
        }
    }
}

pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, RecipeRow>(
        r#"
        SELECT id, title, meal_type, description, ingredients,
               suitable_for_toddler, prep_time_minutes, cook_time_minutes, recipe_url
        FROM recipe_templates
        ORDER BY created_at
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(Recipe::from).collect())
}

/// Built-in templates used when the recipe table is empty.
pub fn fallback_recipes() -> Vec<Recipe> {
    fn ingredient(name: &str, quantity: f64, unit: &str) -> IngredientSpec {
        IngredientSpec {
            name: name.to_string(),
            quantity: Some(quantity),
            unit: Some(unit.to_string()),
        }
    }

    vec![
        Recipe {
            id: "demo-1".into(),
            title: "Pâtes sauce tomate".into(),
            meal_type: MealType::Lunch,
            description: Some("Pâtes complètes avec sauce tomate maison".into()),
            ingredients: vec![
                ingredient("Pâtes", 600.0, "g"),
                ingredient("Tomates", 500.0, "g"),
                ingredient("Oignon", 1.0, "pcs"),
            ],
            suitable_for_toddler: true,
            prep_time_minutes: Some(25),
            cook_time_minutes: None,
            recipe_url: None,
        },
        Recipe {
            id: "demo-2".into(),
            title: "Poulet rôti & légumes".into(),
            meal_type: MealType::Dinner,
            description: Some("Poulet rôti au four avec légumes de saison".into()),
            ingredients: vec![
                ingredient("Poulet", 1.2, "kg"),
                ingredient("Carottes", 400.0, "g"),
                ingredient("Pommes de terre", 600.0, "g"),
            ],
            suitable_for_toddler: true,
            prep_time_minutes: Some(75),
            cook_time_minutes: None,
            recipe_url: None,
        },
        Recipe {
            id: "demo-3".into(),
            title: "Riz au thon".into(),
            meal_type: MealType::Lunch,
            description: Some("Bol de riz complet, thon et petits légumes".into()),
            ingredients: vec![
                ingredient("Riz", 400.0, "g"),
                ingredient("Thon en boîte", 2.0, "pcs"),
                ingredient("Carottes", 200.0, "g"),
            ],
            suitable_for_toddler: true,
            prep_time_minutes: Some(30),
            cook_time_minutes: None,
            recipe_url: None,
        },
        Recipe {
            id: "demo-4".into(),
            title: "Œufs brouillés & pain".into(),
            meal_type: MealType::Breakfast,
            description: Some("Œufs brouillés moelleux avec tartines beurrées".into()),
            ingredients: vec![
                ingredient("Œufs", 8.0, "pcs"),
                ingredient("Lait", 0.2, "l"),
                ingredient("Pain", 1.0, "pcs"),
            ],
            suitable_for_toddler: true,
            prep_time_minutes: Some(15),
            cook_time_minutes: None,
            recipe_url: None,
        },
        Recipe {
            id: "demo-5".into(),
            title: "Salade composée".into(),
            meal_type: MealType::Dinner,
            description: Some("Salade fraîche avec thon, tomates, œufs durs".into()),
            ingredients: vec![
                ingredient("Salade", 1.0, "pcs"),
                ingredient("Thon en boîte", 2.0, "pcs"),
                ingredient("Tomates", 3.0, "pcs"),
                ingredient("Œufs", 4.0, "pcs"),
            ],
            suitable_for_toddler: false,
            prep_time_minutes: Some(20),
            cook_time_minutes: None,
            recipe_url: None,
        },
    ]
}
