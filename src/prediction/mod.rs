//! The prediction call surface: raw form input in, delivery date out.
//!
//! ```text
//! raw strings ──▶ FeatureNormalizer ──▶ Estimator ──▶ assemble ──▶ DeliveryPrediction
//!                   (NormalizationError)               (InvalidDateError)
//! ```

mod assembler;

pub use assembler::{ORDER_DATE_FORMAT, assemble, parse_order_date};

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::estimation::{EstimationResult, Estimator};
use crate::features::FeatureNormalizer;

/// A delivery date prediction for one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPrediction {
    pub order_date: NaiveDate,
    pub estimated_delivery_date: NaiveDate,
    pub estimation: EstimationResult,
}

impl DeliveryPrediction {
    pub fn predicted_duration_days(&self) -> u32 {
        self.estimation.predicted_duration_days
    }
}

/// Normalizes, estimates and assembles in one call.
pub struct Predictor {
    normalizer: FeatureNormalizer,
    estimator: Arc<Estimator>,
}

impl Predictor {
    /// Create a predictor. The estimator is shared so its strategy can be
    /// swapped while this predictor keeps serving calls.
    pub fn new(normalizer: FeatureNormalizer, estimator: Arc<Estimator>) -> Self {
        Self {
            normalizer,
            estimator,
        }
    }

    /// Predict the delivery date for an order placed on `order_date`.
    pub fn predict_delivery(
        &self,
        raw_product_category: &str,
        raw_customer_location: &str,
        raw_shipping_method: &str,
        order_date: NaiveDate,
    ) -> Result<DeliveryPrediction> {
        let features = self.normalizer.normalize(
            raw_product_category,
            raw_customer_location,
            raw_shipping_method,
        )?;
        let result = self.estimator.estimate(&features);
        Ok(assemble(result, order_date)?)
    }

    /// Same as [`Predictor::predict_delivery`], with the date as entered.
    pub fn predict_delivery_str(
        &self,
        raw_product_category: &str,
        raw_customer_location: &str,
        raw_shipping_method: &str,
        raw_order_date: &str,
    ) -> Result<DeliveryPrediction> {
        // Validate attributes first so the user fixes those before the date.
        let features = self.normalizer.normalize(
            raw_product_category,
            raw_customer_location,
            raw_shipping_method,
        )?;
        let order_date = parse_order_date(raw_order_date)?;
        let result = self.estimator.estimate(&features);
        Ok(assemble(result, order_date)?)
    }

    /// The engine, for strategy swaps.
    pub fn estimator(&self) -> &Arc<Estimator> {
        &self.estimator
    }

    pub fn normalizer(&self) -> &FeatureNormalizer {
        &self.normalizer
    }
}

impl Default for Predictor {
    fn default() -> Self {
        Self::new(FeatureNormalizer::default(), Arc::new(Estimator::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PredictionError;
    use crate::estimation::Confidence;
    use crate::features::Field;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_predict_delivery_end_to_end() {
        let prediction = Predictor::default()
            .predict_delivery("electronics", "LOCAL", "express", date(2024, 1, 1))
            .unwrap();
        assert_eq!(prediction.predicted_duration_days(), 2);
        assert_eq!(prediction.estimation.confidence, Confidence::High);
        assert_eq!(prediction.estimated_delivery_date, date(2024, 1, 3));
    }

    #[test]
    fn test_predict_delivery_rejects_unknown_category() {
        let err = Predictor::default()
            .predict_delivery("teleportation", "Local", "Express", date(2024, 1, 1))
            .unwrap_err();
        match err {
            PredictionError::Normalization(e) => {
                assert_eq!(e.field, Field::ProductCategory);
                assert_eq!(e.raw_value, "teleportation");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_predict_delivery_str_reports_bad_date() {
        let err = Predictor::default()
            .predict_delivery_str("Large", "International", "Economy", "2024-13-01")
            .unwrap_err();
        assert!(matches!(err, PredictionError::InvalidDate(_)));
    }

    #[test]
    fn test_attribute_errors_take_precedence_over_date() {
        let err = Predictor::default()
            .predict_delivery_str("Large", "Atlantis", "Economy", "not a date")
            .unwrap_err();
        assert!(matches!(err, PredictionError::Normalization(_)));
    }

    #[test]
    fn test_predict_delivery_str_large_international_economy() {
        let prediction = Predictor::default()
            .predict_delivery_str("Large", "International", "Economy", "2024-01-01")
            .unwrap();
        assert_eq!(prediction.predicted_duration_days(), 18);
        assert_eq!(prediction.estimated_delivery_date, date(2024, 1, 19));
    }
}
