//! Mock commerce source for testing without network calls.

use super::{CommerceError, CommerceSource};
use crate::domain::{OrderId, ProductId};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// Mock commerce source that serves predefined payloads.
#[derive(Debug, Clone, Default)]
pub struct MockCommerceSource {
    orders: HashMap<String, Value>,
    edition_sizes: HashMap<String, i64>,
}

impl MockCommerceSource {
    /// Create a new mock commerce source with no data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an order payload. The payload's `id` field keys lookups and its
    /// `line_items[].product_id` fields key per-product queries.
    pub fn with_order(mut self, order: Value) -> Self {
        let id = order
            .get("id")
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default();
        self.orders.insert(id, order);
        self
    }

    /// Set a product's configured edition size.
    pub fn with_edition_size(mut self, product_id: &str, size: i64) -> Self {
        self.edition_sizes.insert(product_id.to_string(), size);
        self
    }
}

#[async_trait]
impl CommerceSource for MockCommerceSource {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Value, CommerceError> {
        self.orders
            .get(order_id.as_str())
            .cloned()
            .ok_or_else(|| CommerceError::Http {
                status: 404,
                message: format!("no such order: {}", order_id),
            })
    }

    async fn fetch_orders_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Value>, CommerceError> {
        let mut matches: Vec<(&String, &Value)> = self
            .orders
            .iter()
            .filter(|(_, order)| {
                order
                    .get("line_items")
                    .and_then(Value::as_array)
                    .map(|items| {
                        items.iter().any(|li| {
                            li.get("product_id")
                                .map(|v| match v {
                                    Value::String(s) => s == product_id.as_str(),
                                    other => other.to_string() == product_id.as_str(),
                                })
                                .unwrap_or(false)
                        })
                    })
                    .unwrap_or(false)
            })
            .collect();
        matches.sort_by_key(|(id, _)| (*id).clone());
        Ok(matches.into_iter().map(|(_, order)| order.clone()).collect())
    }

    async fn fetch_edition_size(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<i64>, CommerceError> {
        Ok(self.edition_sizes.get(product_id.as_str()).copied())
    }
}
