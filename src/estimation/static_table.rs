//! Additive table lookup: shipping base + location + category.

use std::sync::Arc;

use super::{Confidence, EstimationResult, EstimationStrategy, EstimationTables, clamp_days};
use crate::features::OrderFeatures;

pub const STRATEGY_ID: &str = "static-table/v1";

/// Reference strategy. Shipping method sets the base transit time, distance
/// and handling add to it.
#[derive(Debug, Clone)]
pub struct StaticTableStrategy {
    tables: Arc<EstimationTables>,
}

impl StaticTableStrategy {
    /// Create a strategy over shared tables.
    pub fn new(tables: Arc<EstimationTables>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &EstimationTables {
        &self.tables
    }
}

impl Default for StaticTableStrategy {
    fn default() -> Self {
        Self::new(Arc::new(EstimationTables::default()))
    }
}

impl EstimationStrategy for StaticTableStrategy {
    fn id(&self) -> &str {
        STRATEGY_ID
    }

    fn estimate(&self, features: &OrderFeatures) -> EstimationResult {
        let terms = self.tables.terms(features);
        let confidence = if terms.complete {
            Confidence::High
        } else {
            Confidence::Fallback
        };
        EstimationResult::new(clamp_days(terms.sum()), confidence, STRATEGY_ID)
    }
}
