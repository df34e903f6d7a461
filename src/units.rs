//! Quantity/unit normalization for recipe ingredients.
//!
//! Free-text units coming from AI proposals or user input collapse into a
//! small canonical set, quantities are converted to base units (g, ml, pcs)
//! and clamped to per-family plausible ranges so one hallucinated
//! "5000 g de sel" cannot dominate a shopping list.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_FAMILY_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    G,
    Mg,
    L,
    Cl,
    Ml,
    Pcs,
}

impl Unit {
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::G => "g",
            Unit::Mg => "mg",
            Unit::L => "l",
            Unit::Cl => "cl",
            Unit::Ml => "ml",
            Unit::Pcs => "pcs",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collapses a free-text unit to the canonical set. Unknown text (including
/// empty input) defaults to pieces.
pub fn sanitize_unit(raw: &str) -> Unit {
    match raw.trim().to_lowercase().as_str() {
        "kg" | "kilo" | "kilos" | "kilogramme" | "kilogrammes" => Unit::Kg,
        "g" | "gr" | "gramme" | "grammes" => Unit::G,
        "mg" | "milligramme" | "milligrammes" => Unit::Mg,
        "l" | "litre" | "litres" => Unit::L,
        "cl" | "centilitre" | "centilitres" => Unit::Cl,
        "ml" | "millilitre" | "millilitres" => Unit::Ml,
        _ => Unit::Pcs,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedQuantity {
    /// None when the raw quantity was absent, non-finite or non-positive.
    pub quantity: Option<f64>,
    pub unit: Unit,
}

/// Normalizes a raw quantity/unit pair against a family size.
///
/// Mass converts to grams, volume to milliliters, then the value is clamped
/// to `[10, 180×size]` g, `[10, 320×size]` ml or `[1, 4×size]` pcs and
/// rounded (nearest 10 for g/ml, nearest integer for pcs). A family size of
/// zero falls back to the default of four.
pub fn normalize_quantity(
    raw_quantity: Option<f64>,
    raw_unit: &str,
    family_size: usize,
) -> NormalizedQuantity {
    let size = if family_size == 0 { DEFAULT_FAMILY_SIZE } else { family_size } as f64;

    let mut unit = sanitize_unit(raw_unit);
    let mut quantity = match raw_quantity {
        Some(q) if q.is_finite() && q > 0.0 => q,
        _ => return NormalizedQuantity { quantity: None, unit },
    };

    match unit {
        Unit::Kg => {
            quantity *= 1000.0;
            unit = Unit::G;
        }
        Unit::Mg => {
            quantity /= 1000.0;
            unit = Unit::G;
        }
        Unit::L => {
            quantity *= 1000.0;
            unit = Unit::Ml;
        }
        Unit::Cl => {
            quantity *= 10.0;
            unit = Unit::Ml;
        }
        _ => {}
    }

    let (min, max) = match unit {
        Unit::G => (10.0, 180.0 * size),
        Unit::Ml => (10.0, 320.0 * size),
        Unit::Pcs => (1.0, 4.0 * size),
        _ => (1.0, 500.0 * size),
    };
    quantity = quantity.clamp(min, max);

    quantity = match unit {
        Unit::G | Unit::Ml => (quantity / 10.0).round() * 10.0,
        Unit::Pcs => quantity.round(),
        _ => quantity,
    };

    NormalizedQuantity {
        quantity: Some(quantity),
        unit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_kilograms_to_clamped_grams() {
        let n = normalize_quantity(Some(5.0), "kg", 4);
        assert_eq!(n.unit, Unit::G);
        // 5000 g clamps to the 180 g per-person ceiling for four people.
        assert_eq!(n.quantity, Some(720.0));
    }

    #[test]
    fn converts_volumes_to_milliliters() {
        let n = normalize_quantity(Some(0.2), "L", 4);
        assert_eq!(n.unit, Unit::Ml);
        assert_eq!(n.quantity, Some(200.0));

        let n = normalize_quantity(Some(25.0), "cl", 4);
        assert_eq!(n.unit, Unit::Ml);
        assert_eq!(n.quantity, Some(250.0));
    }

    #[test]
    fn non_positive_quantity_keeps_normalized_unit() {
        let n = normalize_quantity(Some(-1.0), "kg", 4);
        assert_eq!(n.quantity, None);
        assert_eq!(n.unit, Unit::Kg);

        let n = normalize_quantity(None, "grammes", 4);
        assert_eq!(n.quantity, None);
        assert_eq!(n.unit, Unit::G);

        let n = normalize_quantity(Some(f64::NAN), "ml", 4);
        assert_eq!(n.quantity, None);
    }

    #[test]
    fn grams_and_milliliters_round_to_tens() {
        for (qty, unit) in [(123.0, "g"), (87.0, "ml"), (0.143, "kg")] {
            let n = normalize_quantity(Some(qty), unit, 4);
            let value = n.quantity.unwrap();
            assert_eq!(value % 10.0, 0.0, "{qty} {unit} -> {value}");
        }
    }

    #[test]
    fn pieces_round_and_clamp_per_family() {
        let n = normalize_quantity(Some(2.6), "pièces", 4);
        assert_eq!(n.unit, Unit::Pcs);
        assert_eq!(n.quantity, Some(3.0));

        // 40 eggs for a family of four clamps to 16.
        let n = normalize_quantity(Some(40.0), "pcs", 4);
        assert_eq!(n.quantity, Some(16.0));

        // Floor of one piece.
        let n = normalize_quantity(Some(0.2), "unité", 4);
        assert_eq!(n.quantity, Some(1.0));
    }

    #[test]
    fn unknown_unit_defaults_to_pieces() {
        assert_eq!(sanitize_unit("sachet"), Unit::Pcs);
        assert_eq!(sanitize_unit(""), Unit::Pcs);
        let n = normalize_quantity(Some(2.0), "cuillères", 4);
        assert_eq!(n.unit, Unit::Pcs);
    }

    #[test]
    fn zero_family_size_uses_default() {
        let n = normalize_quantity(Some(5.0), "kg", 0);
        assert_eq!(n.quantity, Some(720.0));
    }

    #[test]
    fn final_unit_is_always_base() {
        for unit in ["kg", "g", "mg", "l", "cl", "ml", "pcs", "???"] {
            let n = normalize_quantity(Some(3.0), unit, 4);
            assert!(matches!(n.unit, Unit::G | Unit::Ml | Unit::Pcs), "{unit}");
        }
    }
}
