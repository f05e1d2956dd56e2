//! Order history.
//!
//! Placed orders are appended to an [`OrderHistory`] together with the
//! attributes exactly as the user entered them and the prediction that was
//! shown. The estimation core never reads this store back.

mod store;

pub use store::{InMemoryOrderHistory, JsonlOrderHistory};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Identity;
use crate::error::StoreError;
use crate::prediction::DeliveryPrediction;

/// Order attributes as entered, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOrder {
    pub product_category: String,
    pub customer_location: String,
    pub shipping_method: String,
}

impl RawOrder {
    pub fn new(
        product_category: impl Into<String>,
        customer_location: impl Into<String>,
        shipping_method: impl Into<String>,
    ) -> Self {
        Self {
            product_category: product_category.into(),
            customer_location: customer_location.into(),
            shipping_method: shipping_method.into(),
        }
    }
}

/// One placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: Uuid,
    pub user: Identity,
    pub raw: RawOrder,
    pub prediction: DeliveryPrediction,
    pub recorded_at: DateTime<Utc>,
}

impl OrderRecord {
    pub fn new(user: Identity, raw: RawOrder, prediction: DeliveryPrediction) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            raw,
            prediction,
            recorded_at: Utc::now(),
        }
    }
}

/// Append-only order storage.
#[async_trait]
pub trait OrderHistory: Send + Sync {
    /// Persist an order.
    async fn append(&self, record: &OrderRecord) -> Result<(), StoreError>;

    /// A user's orders, newest first.
    async fn list_for_user(
        &self,
        user: &Identity,
        limit: usize,
    ) -> Result<Vec<OrderRecord>, StoreError>;
}
