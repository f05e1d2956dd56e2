//! Weighted variant of the additive tables.

use std::sync::Arc;

use super::{Confidence, EstimationResult, EstimationStrategy, EstimationTables, clamp_days};
use crate::features::OrderFeatures;

pub const STRATEGY_ID: &str = "weighted-rule/v1";

/// Scales each table term by its weight before summing. Results are at most
/// [`Confidence::Medium`] since the weights are tuned by hand.
#[derive(Debug, Clone)]
pub struct WeightedRuleStrategy {
    tables: Arc<EstimationTables>,
}

impl WeightedRuleStrategy {
    /// Create a strategy over shared tables; term weights come from `tables.weights`.
    pub fn new(tables: Arc<EstimationTables>) -> Self {
        Self { tables }
    }
}

impl EstimationStrategy for WeightedRuleStrategy {
    fn id(&self) -> &str {
        STRATEGY_ID
    }

    fn estimate(&self, features: &OrderFeatures) -> EstimationResult {
        let terms = self.tables.terms(features);
        let w = &self.tables.weights;

        let weighted = w.base * terms.base as f64
            + w.location * terms.location as f64
            + w.category * terms.category as f64;
        // Weights are validated finite, but a hand-built table may not be.
        let total = if weighted.is_finite() {
            weighted.round() as i64
        } else {
            terms.sum()
        };

        let confidence = if terms.complete && weighted.is_finite() {
            Confidence::Medium
        } else {
            Confidence::Fallback
        };
        EstimationResult::new(clamp_days(total), confidence, STRATEGY_ID)
    }
}
