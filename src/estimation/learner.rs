//! Statistical learning from observed delivery times.
//!
//! The learner keeps an exponential moving average of `actual / predicted`
//! per (shipping method, location) lane. A [`LearnedModel`] snapshot applies
//! those factors on top of a base strategy and can be installed through
//! [`super::ModelBackedStrategy`].

use std::collections::HashMap;
use std::sync::Arc;

use super::{Confidence, DurationModel, EstimationStrategy, ModelError, ModelOutput};
use crate::features::{CustomerLocation, OrderFeatures, ShippingMethod};

type Lane = (ShippingMethod, CustomerLocation);

/// Learned correction for one lane.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningModel {
    /// Duration adjustment factor (multiplier).
    pub time_factor: f64,
    /// Number of samples.
    pub sample_count: u64,
    /// Running relative error of the learned estimate: how far each actual
    /// fell from the corrected prediction in force when it was recorded.
    pub error_rate: f64,
}

impl Default for LearningModel {
    fn default() -> Self {
        Self {
            time_factor: 1.0,
            sample_count: 0,
            error_rate: 0.0,
        }
    }
}

impl LearningModel {
    /// 0.5 to 1.0: more samples and lower error score higher.
    fn score(&self) -> f64 {
        let sample_factor = (self.sample_count as f64 / 100.0).min(1.0);
        let error_factor = 1.0 - self.error_rate.min(1.0);
        0.5 + (sample_factor * 0.3) + (error_factor * 0.2)
    }

    fn confidence(&self) -> Confidence {
        let score = self.score();
        if score >= 0.85 {
            Confidence::High
        } else if score >= 0.65 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// Records actual delivery times and learns per-lane corrections.
pub struct DurationLearner {
    models: HashMap<Lane, LearningModel>,
    /// Exponential moving average alpha.
    alpha: f64,
    /// Minimum samples before a lane is trusted.
    min_samples: u64,
}

impl DurationLearner {
    /// Create a learner with alpha 0.1 that trusts a lane after 5 samples.
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
            alpha: 0.1,
            min_samples: 5,
        }
    }

    /// Record a delivered order.
    pub fn record(&mut self, features: &OrderFeatures, predicted_days: u32, actual_days: u32) {
        let lane = (features.shipping_method, features.customer_location);
        let model = self.models.entry(lane).or_default();
        model.sample_count += 1;

        let ratio = if predicted_days > 0 {
            f64::from(actual_days) / f64::from(predicted_days)
        } else {
            1.0
        };

        let prior = model.time_factor;
        let error = (ratio - prior).abs() / prior.max(f64::EPSILON);
        model.error_rate = model.error_rate * (1.0 - self.alpha) + error * self.alpha;
        model.time_factor = prior * (1.0 - self.alpha) + ratio * self.alpha;

        tracing::debug!(
            shipping = %features.shipping_method,
            location = %features.customer_location,
            samples = model.sample_count,
            factor = model.time_factor,
            "Recorded delivery outcome"
        );
    }

    pub fn get_model(
        &self,
        shipping: ShippingMethod,
        location: CustomerLocation,
    ) -> Option<&LearningModel> {
        self.models.get(&(shipping, location))
    }

    /// Set the EMA alpha.
    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha.clamp(0.01, 0.5);
    }

    /// Set the number of samples a lane needs before snapshots use it.
    pub fn set_min_samples(&mut self, min: u64) {
        self.min_samples = min;
    }

    /// Clear all learned data.
    pub fn clear(&mut self) {
        self.models.clear();
    }

    /// Freeze the current state into an immutable model over `base`.
    pub fn snapshot(&self, base: Arc<dyn EstimationStrategy>) -> LearnedModel {
        LearnedModel {
            id: format!("learned-ema/{}", base.id()),
            models: self.models.clone(),
            min_samples: self.min_samples,
            base,
        }
    }
}

impl Default for DurationLearner {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable snapshot of a [`DurationLearner`].
pub struct LearnedModel {
    id: String,
    models: HashMap<Lane, LearningModel>,
    min_samples: u64,
    base: Arc<dyn EstimationStrategy>,
}

impl DurationModel for LearnedModel {
    fn model_id(&self) -> &str {
        &self.id
    }

    fn predict(&self, features: &OrderFeatures) -> Result<ModelOutput, ModelError> {
        let lane = (features.shipping_method, features.customer_location);
        let samples = self.models.get(&lane).map_or(0, |m| m.sample_count);
        let model = match self.models.get(&lane) {
            Some(m) if m.sample_count >= self.min_samples => m,
            _ => {
                return Err(ModelError::InsufficientData {
                    samples,
                    required: self.min_samples,
                });
            }
        };

        let base = self.base.estimate(features);
        if base.is_fallback() {
            return Err(ModelError::Unavailable(format!(
                "base strategy {} returned a fallback estimate",
                base.strategy_id
            )));
        }

        Ok(ModelOutput {
            days: f64::from(base.predicted_duration_days) * model.time_factor,
            confidence: model.confidence(),
        })
    }
}
