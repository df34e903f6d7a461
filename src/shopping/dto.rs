use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateShoppingRequest {
    pub product_id: Option<Uuid>,
    pub name: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default = "default_priority")]
    pub priority: String,
}

#[derive(Debug, Deserialize)]
pub struct PatchShoppingRequest {
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub priority: Option<String>,
    pub is_purchased: Option<bool>,
}

/// Voice-assistant intake: free-text item, fuzzy-matched to a product.
#[derive(Debug, Deserialize)]
pub struct AlexaItemRequest {
    pub item: String,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_quantity() -> f64 {
    1.0
}

fn default_unit() -> String {
    "pcs".to_string()
}

fn default_priority() -> String {
    super::repo::PRIORITY_MEDIUM.to_string()
}
