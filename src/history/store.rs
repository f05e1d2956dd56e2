//! Order history backends.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use super::{OrderHistory, OrderRecord};
use crate::auth::Identity;
use crate::error::StoreError;
use crate::storage;

/// Orders appended to a JSON-lines file.
pub struct JsonlOrderHistory {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlOrderHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl OrderHistory for JsonlOrderHistory {
    async fn append(&self, record: &OrderRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        storage::append_record(&self.path, record).await?;
        tracing::debug!(order_id = %record.id, path = %self.path.display(), "Appended order");
        Ok(())
    }

    async fn list_for_user(
        &self,
        user: &Identity,
        limit: usize,
    ) -> Result<Vec<OrderRecord>, StoreError> {
        let records: Vec<OrderRecord> = storage::read_records(&self.path).await?;
        Ok(newest_first(records, user, limit))
    }
}

/// Orders held in memory.
#[derive(Default)]
pub struct InMemoryOrderHistory {
    records: RwLock<Vec<OrderRecord>>,
}

impl InMemoryOrderHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl OrderHistory for InMemoryOrderHistory {
    async fn append(&self, record: &OrderRecord) -> Result<(), StoreError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn list_for_user(
        &self,
        user: &Identity,
        limit: usize,
    ) -> Result<Vec<OrderRecord>, StoreError> {
        let records = self.records.read().await.clone();
        Ok(newest_first(records, user, limit))
    }
}

/// Records are stored in append order, so reversing gives newest first.
fn newest_first(records: Vec<OrderRecord>, user: &Identity, limit: usize) -> Vec<OrderRecord> {
    records
        .into_iter()
        .rev()
        .filter(|r| &r.user == user)
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::RawOrder;
    use crate::prediction::Predictor;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn record(email: &str, shipping: &str) -> OrderRecord {
        let raw = RawOrder::new("Clothing", "Regional", shipping);
        let prediction = Predictor::default()
            .predict_delivery(
                &raw.product_category,
                &raw.customer_location,
                &raw.shipping_method,
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            )
            .unwrap();
        OrderRecord::new(
            Identity {
                email: email.to_string(),
            },
            raw,
            prediction,
        )
    }

    #[tokio::test]
    async fn test_jsonl_history_round_trip() {
        let dir = tempdir().unwrap();
        let history = JsonlOrderHistory::new(dir.path().join("orders.jsonl"));

        let first = record("a@example.com", "Express");
        let second = record("a@example.com", "Economy");
        history.append(&first).await.unwrap();
        history.append(&record("b@example.com", "Standard")).await.unwrap();
        history.append(&second).await.unwrap();

        let user = first.user.clone();
        let listed = history.list_for_user(&user, 10).await.unwrap();
        assert_eq!(listed, vec![second, first]);
    }

    #[tokio::test]
    async fn test_limit_applies_after_filtering() {
        let history = InMemoryOrderHistory::new();
        for shipping in ["Express", "Standard", "Economy"] {
            history.append(&record("a@example.com", shipping)).await.unwrap();
        }
        history.append(&record("b@example.com", "Express")).await.unwrap();

        let user = Identity {
            email: "a@example.com".to_string(),
        };
        let listed = history.list_for_user(&user, 2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].raw.shipping_method, "Economy");
        assert_eq!(listed[1].raw.shipping_method, "Standard");
        assert_eq!(history.len().await, 4);
    }

    #[tokio::test]
    async fn test_empty_history() {
        let dir = tempdir().unwrap();
        let history = JsonlOrderHistory::new(dir.path().join("orders.jsonl"));
        let user = Identity {
            email: "a@example.com".to_string(),
        };
        assert!(history.list_for_user(&user, 5).await.unwrap().is_empty());
    }
}
