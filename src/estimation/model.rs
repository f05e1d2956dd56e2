//! Model-backed estimation.
//!
//! A [`DurationModel`] is anything that can score [`OrderFeatures`], from a
//! learned correction table to a remote inference client. The strategy
//! wrapping it keeps the engine total: if the model errors, the fallback
//! strategy's duration is used and the result is marked
//! [`Confidence::Fallback`].

use std::sync::Arc;

use thiserror::Error;

use super::{Confidence, EstimationResult, EstimationStrategy, clamp_days};
use crate::features::OrderFeatures;

/// Error type for model inference.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Not enough samples: {samples} of {required}")]
    InsufficientData { samples: u64, required: u64 },

    #[error("Model unavailable: {0}")]
    Unavailable(String),

    #[error("Model returned an invalid duration: {0}")]
    InvalidOutput(f64),
}

/// Raw model prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelOutput {
    /// Predicted duration in days. Fractional values are rounded.
    pub days: f64,
    pub confidence: Confidence,
}

/// A predictor that can back [`ModelBackedStrategy`].
///
/// Implementations that block (e.g. a network call) should be invoked behind
/// the caller's own timeout.
pub trait DurationModel: Send + Sync {
    /// Identifier, used to build the strategy id.
    fn model_id(&self) -> &str;

    fn predict(&self, features: &OrderFeatures) -> Result<ModelOutput, ModelError>;
}

/// Strategy that delegates to a [`DurationModel`].
pub struct ModelBackedStrategy {
    id: String,
    model: Arc<dyn DurationModel>,
    fallback: Arc<dyn EstimationStrategy>,
}

impl ModelBackedStrategy {
    /// Wrap a model. `fallback` supplies the duration when the model fails.
    pub fn new(model: Arc<dyn DurationModel>, fallback: Arc<dyn EstimationStrategy>) -> Self {
        Self {
            id: format!("model/{}", model.model_id()),
            model,
            fallback,
        }
    }

    fn degrade(&self, features: &OrderFeatures, error: &ModelError) -> EstimationResult {
        tracing::warn!(
            model = self.model.model_id(),
            %features,
            error = %error,
            "Duration model failed; using fallback strategy"
        );
        let fallback = self.fallback.estimate(features);
        EstimationResult::new(
            fallback.predicted_duration_days,
            Confidence::Fallback,
            self.id.clone(),
        )
    }
}

impl EstimationStrategy for ModelBackedStrategy {
    fn id(&self) -> &str {
        &self.id
    }

    fn estimate(&self, features: &OrderFeatures) -> EstimationResult {
        let output = self.model.predict(features).and_then(|output| {
            if output.days.is_finite() && output.days >= 0.0 {
                Ok(output)
            } else {
                Err(ModelError::InvalidOutput(output.days))
            }
        });

        match output {
            Ok(output) => {
                // Fallback is reserved for defaults; a successful prediction
                // is at worst low confidence.
                let confidence = match output.confidence {
                    Confidence::Fallback => Confidence::Low,
                    other => other,
                };
                EstimationResult::new(
                    clamp_days(output.days.round() as i64),
                    confidence,
                    self.id.clone(),
                )
            }
            Err(e) => self.degrade(features, &e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::StaticTableStrategy;
    use crate::features::{CustomerLocation, ProductCategory, ShippingMethod};

    struct FixedModel(Result<ModelOutput, ModelError>);

    impl DurationModel for FixedModel {
        fn model_id(&self) -> &str {
            "fixed"
        }

        fn predict(&self, _features: &OrderFeatures) -> Result<ModelOutput, ModelError> {
            self.0.clone()
        }
    }

    fn strategy(output: Result<ModelOutput, ModelError>) -> ModelBackedStrategy {
        ModelBackedStrategy::new(
            Arc::new(FixedModel(output)),
            Arc::new(StaticTableStrategy::default()),
        )
    }

    fn features() -> OrderFeatures {
        OrderFeatures::new(
            ProductCategory::Fragile,
            CustomerLocation::Regional,
            ShippingMethod::Standard,
        )
    }

    #[test]
    fn test_model_output_is_used() {
        let result = strategy(Ok(ModelOutput {
            days: 3.6,
            confidence: Confidence::Medium,
        }))
        .estimate(&features());
        assert_eq!(result.predicted_duration_days, 4);
        assert_eq!(result.confidence, Confidence::Medium);
        assert_eq!(result.strategy_id, "model/fixed");
    }

    #[test]
    fn test_model_failure_degrades_to_fallback() {
        let result = strategy(Err(ModelError::Unavailable("timeout".into()))).estimate(&features());
        // Static table: 5 + 1 + 1
        assert_eq!(result.predicted_duration_days, 7);
        assert_eq!(result.confidence, Confidence::Fallback);
    }

    #[test]
    fn test_invalid_model_output_degrades() {
        let result = strategy(Ok(ModelOutput {
            days: f64::INFINITY,
            confidence: Confidence::High,
        }))
        .estimate(&features());
        assert_eq!(result.confidence, Confidence::Fallback);
        assert_eq!(result.predicted_duration_days, 7);
    }

    #[test]
    fn test_successful_prediction_is_never_fallback() {
        let result = strategy(Ok(ModelOutput {
            days: 0.2,
            confidence: Confidence::Fallback,
        }))
        .estimate(&features());
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.predicted_duration_days, 1);
    }
}
