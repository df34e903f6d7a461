use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use super::repo::{InventoryEntry, Product};

/// Create an inventory batch for an existing product or by free-text name
/// (the product is then found or created by normalized name).
#[derive(Debug, Deserialize)]
pub struct CreateInventoryRequest {
    pub product_id: Option<Uuid>,
    pub name: Option<String>,
    #[serde(alias = "qty")]
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    #[serde(default, with = "crate::dates::iso_date_option")]
    pub expiry_date: Option<Date>,
    #[serde(default)]
    pub minimum_threshold: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInventoryRequest {
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "double_option_date")]
    pub expiry_date: Option<Option<Date>>,
    pub minimum_threshold: Option<f64>,
}

/// Distinguishes an absent field from an explicit null so an expiry date can
/// be cleared.
fn double_option_date<'de, D>(de: D) -> Result<Option<Option<Date>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    crate::dates::iso_date_option::deserialize(de).map(Some)
}

#[derive(Debug, Serialize)]
pub struct InventoryItem {
    #[serde(flatten)]
    pub entry: InventoryEntry,
    pub product: Option<Product>,
}
