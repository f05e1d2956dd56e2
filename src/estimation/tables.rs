//! Lookup tables behind the additive estimators.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::features::{CustomerLocation, OrderFeatures, ProductCategory, ShippingMethod};

/// Base duration used when a shipping method has no table row. Matches the
/// flat five-day estimate the order form used before per-attribute tables.
pub const DEFAULT_BASE_DAYS: u32 = 5;

/// Per-term multipliers for [`super::WeightedRuleStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermWeights {
    pub base: f64,
    pub location: f64,
    pub category: f64,
}

impl Default for TermWeights {
    fn default() -> Self {
        Self {
            base: 1.0,
            location: 1.0,
            category: 1.0,
        }
    }
}

/// Base durations and additive adjustments, in days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationTables {
    /// Last-resort base duration for a shipping method with no row.
    pub default_base_days: u32,
    pub base_days: BTreeMap<ShippingMethod, u32>,
    pub location_adjustments: BTreeMap<CustomerLocation, i32>,
    pub category_adjustments: BTreeMap<ProductCategory, i32>,
    pub weights: TermWeights,
}

impl Default for EstimationTables {
    fn default() -> Self {
        let base_days = BTreeMap::from([
            (ShippingMethod::Express, 2),
            (ShippingMethod::Standard, 5),
            (ShippingMethod::Economy, 9),
        ]);
        let location_adjustments = BTreeMap::from([
            (CustomerLocation::Local, 0),
            (CustomerLocation::Regional, 1),
            (CustomerLocation::Remote, 3),
            (CustomerLocation::International, 7),
        ]);
        let category_adjustments = BTreeMap::from([
            (ProductCategory::Electronics, 0),
            (ProductCategory::Clothing, 0),
            (ProductCategory::Fragile, 1),
            (ProductCategory::Large, 2),
            (ProductCategory::Other, 0),
        ]);

        Self {
            default_base_days: DEFAULT_BASE_DAYS,
            base_days,
            location_adjustments,
            category_adjustments,
            weights: TermWeights::default(),
        }
    }
}

/// The three looked-up terms for one order, and whether every lookup hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terms {
    pub base: i64,
    pub location: i64,
    pub category: i64,
    /// False when any term came from a last-resort default.
    pub complete: bool,
}

impl Terms {
    pub fn sum(&self) -> i64 {
        self.base + self.location + self.category
    }
}

impl EstimationTables {
    /// Look up all three terms. A missing row falls back to
    /// `default_base_days` (base) or zero (adjustments) and marks the result
    /// incomplete.
    pub fn terms(&self, features: &OrderFeatures) -> Terms {
        let base = self.base_days.get(&features.shipping_method).copied();
        let location = self
            .location_adjustments
            .get(&features.customer_location)
            .copied();
        let category = self
            .category_adjustments
            .get(&features.product_category)
            .copied();

        let complete = base.is_some() && location.is_some() && category.is_some();
        if !complete {
            tracing::warn!(
                %features,
                base_hit = base.is_some(),
                location_hit = location.is_some(),
                category_hit = category.is_some(),
                "Estimation table is missing a row; using defaults"
            );
        }

        Terms {
            base: i64::from(base.unwrap_or(self.default_base_days)),
            location: i64::from(location.unwrap_or(0)),
            category: i64::from(category.unwrap_or(0)),
            complete,
        }
    }

    /// Reject values the estimators cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("weights.base", self.weights.base),
            ("weights.location", self.weights.location),
            ("weights.category", self.weights.category),
        ];
        for (key, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: format!("weight must be a non-negative number, got {weight}"),
                });
            }
        }

        if self.default_base_days == 0 {
            return Err(ConfigError::InvalidValue {
                key: "default_base_days".to_string(),
                reason: "must be at least one day".to_string(),
            });
        }

        Ok(())
    }

    /// Attributes with no table row, for startup diagnostics.
    pub fn missing_rows(&self) -> Vec<String> {
        let mut missing = Vec::new();
        for method in ShippingMethod::ALL {
            if !self.base_days.contains_key(&method) {
                missing.push(format!("base_days.{method}"));
            }
        }
        for location in CustomerLocation::ALL {
            if !self.location_adjustments.contains_key(&location) {
                missing.push(format!("location_adjustments.{location}"));
            }
        }
        for category in ProductCategory::ALL {
            if !self.category_adjustments.contains_key(&category) {
                missing.push(format!("category_adjustments.{category}"));
            }
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_are_complete() {
        let tables = EstimationTables::default();
        assert!(tables.missing_rows().is_empty());
        assert!(tables.validate().is_ok());
    }

    #[test]
    fn test_terms_for_large_international_economy() {
        let tables = EstimationTables::default();
        let terms = tables.terms(&OrderFeatures::new(
            ProductCategory::Large,
            CustomerLocation::International,
            ShippingMethod::Economy,
        ));
        assert_eq!(terms.base, 9);
        assert_eq!(terms.location, 7);
        assert_eq!(terms.category, 2);
        assert_eq!(terms.sum(), 18);
        assert!(terms.complete);
    }

    #[test]
    fn test_missing_base_row_uses_default() {
        let mut tables = EstimationTables::default();
        tables.base_days.remove(&ShippingMethod::Standard);

        let terms = tables.terms(&OrderFeatures::new(
            ProductCategory::Other,
            CustomerLocation::Local,
            ShippingMethod::Standard,
        ));
        assert_eq!(terms.base, i64::from(DEFAULT_BASE_DAYS));
        assert!(!terms.complete);
        assert_eq!(tables.missing_rows(), vec!["base_days.Standard".to_string()]);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut tables = EstimationTables::default();
        tables.weights.location = -0.5;
        assert!(matches!(
            tables.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "weights.location"
        ));
    }

    #[test]
    fn test_tables_parse_from_partial_json() {
        let tables: EstimationTables = serde_json::from_str(
            r#"{ "base_days": { "Express": 1, "Standard": 4, "Economy": 8 } }"#,
        )
        .unwrap();
        assert_eq!(tables.base_days[&ShippingMethod::Express], 1);
        // Unspecified tables keep their defaults.
        assert_eq!(
            tables.location_adjustments[&CustomerLocation::International],
            7
        );
    }
}
