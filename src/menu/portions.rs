//! Family roster to portion multiplier.

use crate::family::{AgeGroup, FamilyMember};

/// Recipe quantities are baselined on four adults; teenagers eat slightly
/// more, toddlers about half a portion.
const BASE_PORTIONS: f64 = 4.0;

pub fn portion_multiplier(family: &[FamilyMember]) -> f64 {
    let total_weight: f64 = family
        .iter()
        .map(|member| match member.age_group {
            AgeGroup::Toddler => 0.5,
            AgeGroup::Teenager => 1.1,
            AgeGroup::Adult => 1.0,
        })
        .sum();
    ((total_weight / BASE_PORTIONS) * 100.0).round() / 100.0
}
