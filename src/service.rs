//! Order placement: predict, then record.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::auth::Identity;
use crate::error::ServiceError;
use crate::history::{OrderHistory, OrderRecord, RawOrder};
use crate::prediction::Predictor;

/// Ties the predictor to an order history.
pub struct OrderService {
    predictor: Arc<Predictor>,
    history: Arc<dyn OrderHistory>,
}

impl OrderService {
    pub fn new(predictor: Arc<Predictor>, history: Arc<dyn OrderHistory>) -> Self {
        Self { predictor, history }
    }

    /// Predict delivery for an order and append it to the history. Nothing
    /// is written when the input is rejected.
    pub async fn place_order(
        &self,
        user: &Identity,
        raw: RawOrder,
        order_date: NaiveDate,
    ) -> Result<OrderRecord, ServiceError> {
        let prediction = self.predictor.predict_delivery(
            &raw.product_category,
            &raw.customer_location,
            &raw.shipping_method,
            order_date,
        )?;

        let record = OrderRecord::new(user.clone(), raw, prediction);
        self.history.append(&record).await?;

        tracing::info!(
            order_id = %record.id,
            user = %user,
            days = record.prediction.predicted_duration_days(),
            confidence = %record.prediction.estimation.confidence,
            "Order recorded"
        );
        Ok(record)
    }

    /// A user's most recent orders.
    pub async fn history(
        &self,
        user: &Identity,
        limit: usize,
    ) -> Result<Vec<OrderRecord>, ServiceError> {
        Ok(self.history.list_for_user(user, limit).await?)
    }

    pub fn predictor(&self) -> &Arc<Predictor> {
        &self.predictor
    }
}
