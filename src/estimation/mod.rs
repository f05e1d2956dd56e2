//! Delivery-duration estimation.
//!
//! Estimates are produced by a single active [`EstimationStrategy`]:
//! - [`StaticTableStrategy`]: additive lookup tables (the default)
//! - [`WeightedRuleStrategy`]: the same tables with per-term weights
//! - [`ModelBackedStrategy`]: an injected [`DurationModel`], e.g. one trained
//!   by [`DurationLearner`]
//!
//! Estimation never fails. When a strategy has to fall back on a default it
//! says so through [`Confidence::Fallback`].

mod learner;
mod model;
mod static_table;
mod tables;
mod weighted;

pub use learner::{DurationLearner, LearnedModel, LearningModel};
pub use model::{DurationModel, ModelBackedStrategy, ModelError, ModelOutput};
pub use static_table::StaticTableStrategy;
pub use tables::{DEFAULT_BASE_DAYS, EstimationTables, TermWeights, Terms};
pub use weighted::WeightedRuleStrategy;

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::features::OrderFeatures;

/// No estimate is ever shorter than this.
pub const MIN_DURATION_DAYS: u32 = 1;

/// How much weight to put on an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
    /// A last-resort default was used somewhere in the estimate.
    Fallback,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
            Confidence::Fallback => "Fallback",
        };
        f.write_str(s)
    }
}

/// Output of a strategy for one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub predicted_duration_days: u32,
    pub confidence: Confidence,
    /// Identifies the strategy (and version) that produced the estimate.
    pub strategy_id: String,
    pub generated_at: DateTime<Utc>,
}

impl EstimationResult {
    /// Build a result stamped with the current time. The duration is clamped
    /// to [`MIN_DURATION_DAYS`].
    pub fn new(days: u32, confidence: Confidence, strategy_id: impl Into<String>) -> Self {
        Self {
            predicted_duration_days: days.max(MIN_DURATION_DAYS),
            confidence,
            strategy_id: strategy_id.into(),
            generated_at: Utc::now(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.confidence == Confidence::Fallback
    }

    /// Equal apart from `generated_at`.
    pub fn same_estimate(&self, other: &EstimationResult) -> bool {
        self.predicted_duration_days == other.predicted_duration_days
            && self.confidence == other.confidence
            && self.strategy_id == other.strategy_id
    }
}

/// Clamp a signed day count into the valid duration range.
pub(crate) fn clamp_days(total: i64) -> u32 {
    total.clamp(i64::from(MIN_DURATION_DAYS), i64::from(u32::MAX)) as u32
}

/// An interchangeable estimation algorithm.
///
/// Implementations must be total: every [`OrderFeatures`] value gets an
/// estimate, degraded to [`Confidence::Fallback`] if need be.
pub trait EstimationStrategy: Send + Sync {
    /// Stable identifier recorded on every result.
    fn id(&self) -> &str;

    /// Estimate the delivery duration for an order.
    fn estimate(&self, features: &OrderFeatures) -> EstimationResult;
}

/// Built-in strategies selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    #[default]
    Static,
    Weighted,
}

impl StrategyKind {
    pub fn build(&self, tables: Arc<EstimationTables>) -> Arc<dyn EstimationStrategy> {
        match self {
            StrategyKind::Static => Arc::new(StaticTableStrategy::new(tables)),
            StrategyKind::Weighted => Arc::new(WeightedRuleStrategy::new(tables)),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "static" | "static-table" => Ok(StrategyKind::Static),
            "weighted" | "weighted-rule" => Ok(StrategyKind::Weighted),
            other => Err(format!(
                "unknown strategy '{other}', expected 'static' or 'weighted'"
            )),
        }
    }
}

/// The estimation engine: one active strategy, swappable at runtime.
pub struct Estimator {
    active: RwLock<Arc<dyn EstimationStrategy>>,
}

impl Estimator {
    /// Create an estimator around a strategy.
    pub fn new(strategy: Arc<dyn EstimationStrategy>) -> Self {
        tracing::debug!(strategy = strategy.id(), "Estimator initialized");
        Self {
            active: RwLock::new(strategy),
        }
    }

    /// Create an estimator using the static tables.
    pub fn with_tables(tables: Arc<EstimationTables>) -> Self {
        Self::new(Arc::new(StaticTableStrategy::new(tables)))
    }

    /// Estimate with whichever strategy is active right now.
    pub fn estimate(&self, features: &OrderFeatures) -> EstimationResult {
        let strategy = self.active_strategy();
        let result = strategy.estimate(features);
        tracing::debug!(
            %features,
            days = result.predicted_duration_days,
            confidence = %result.confidence,
            strategy = %result.strategy_id,
            "Estimated delivery duration"
        );
        result
    }

    /// Replace the active strategy, returning the previous one. In-flight
    /// estimates finish on the strategy they started with.
    pub fn swap_strategy(
        &self,
        strategy: Arc<dyn EstimationStrategy>,
    ) -> Arc<dyn EstimationStrategy> {
        let mut slot = self.active.write().unwrap_or_else(|e| e.into_inner());
        tracing::info!(from = slot.id(), to = strategy.id(), "Swapping estimation strategy");
        std::mem::replace(&mut *slot, strategy)
    }

    /// The strategy currently in use.
    pub fn active_strategy(&self) -> Arc<dyn EstimationStrategy> {
        self.active
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn active_strategy_id(&self) -> String {
        self.active_strategy().id().to_string()
    }
}

impl Default for Estimator {
    fn default() -> Self {
        Self::with_tables(Arc::new(EstimationTables::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{CustomerLocation, ProductCategory, ShippingMethod};

    struct Constant(u32);

    impl EstimationStrategy for Constant {
        fn id(&self) -> &str {
            "constant"
        }

        fn estimate(&self, _features: &OrderFeatures) -> EstimationResult {
            EstimationResult::new(self.0, Confidence::Low, self.id())
        }
    }

    fn sample() -> OrderFeatures {
        OrderFeatures::new(
            ProductCategory::Electronics,
            CustomerLocation::Local,
            ShippingMethod::Express,
        )
    }

    #[test]
    fn test_default_estimator_uses_static_table() {
        let estimator = Estimator::default();
        let result = estimator.estimate(&sample());
        assert_eq!(result.predicted_duration_days, 2);
        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(estimator.active_strategy_id(), static_table::STRATEGY_ID);
    }

    #[test]
    fn test_swap_strategy_changes_results_not_signature() {
        let estimator = Estimator::default();
        let previous = estimator.swap_strategy(Arc::new(Constant(11)));
        assert_eq!(previous.id(), static_table::STRATEGY_ID);

        let result = estimator.estimate(&sample());
        assert_eq!(result.predicted_duration_days, 11);
        assert_eq!(result.strategy_id, "constant");
    }

    #[test]
    fn test_result_clamps_to_minimum() {
        let result = EstimationResult::new(0, Confidence::Low, "zero");
        assert_eq!(result.predicted_duration_days, MIN_DURATION_DAYS);
        assert_eq!(clamp_days(-40), MIN_DURATION_DAYS);
        assert_eq!(clamp_days(12), 12);
    }

    #[test]
    fn test_estimator_is_shareable_across_threads() {
        let estimator = Arc::new(Estimator::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let estimator = Arc::clone(&estimator);
                std::thread::spawn(move || estimator.estimate(&sample()).predicted_duration_days)
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 2);
        }
    }

    #[test]
    fn test_strategy_kind_parsing() {
        assert_eq!("Weighted".parse::<StrategyKind>(), Ok(StrategyKind::Weighted));
        assert_eq!("static".parse::<StrategyKind>(), Ok(StrategyKind::Static));
        assert!("neural".parse::<StrategyKind>().is_err());
    }
}
