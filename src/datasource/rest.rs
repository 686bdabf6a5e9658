//! REST commerce-backend client (Shopify-style admin API).

use super::{CommerceError, CommerceSource};
use crate::domain::{OrderId, ProductId};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Commerce source over the backend's admin REST API.
#[derive(Debug, Clone)]
pub struct RestCommerceSource {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl RestCommerceSource {
    /// Create a new REST commerce source.
    pub fn new(base_url: String, access_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            access_token,
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value, CommerceError> {
        let url = format!("{}{}", self.base_url, path);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let mut request = self.client.get(&url);
            if let Some(token) = &self.access_token {
                request = request.header("X-Access-Token", token);
            }

            let response = request.send().await.map_err(|e| {
                backoff::Error::transient(CommerceError::Network(e.to_string()))
            })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(CommerceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(CommerceError::Http {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(CommerceError::Http {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| backoff::Error::permanent(CommerceError::Parse(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl CommerceSource for RestCommerceSource {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Value, CommerceError> {
        debug!(order_id = %order_id, "fetching order");
        let response = self.get_json(&format!("/orders/{}.json", order_id)).await?;
        response
            .get("order")
            .cloned()
            .ok_or_else(|| CommerceError::Parse("missing order envelope".to_string()))
    }

    async fn fetch_orders_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Value>, CommerceError> {
        debug!(product_id = %product_id, "fetching orders for product");
        let response = self
            .get_json(&format!("/orders.json?product_id={}&status=any", product_id))
            .await?;
        response
            .get("orders")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| CommerceError::Parse("missing orders envelope".to_string()))
    }

    async fn fetch_edition_size(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<i64>, CommerceError> {
        debug!(product_id = %product_id, "fetching edition size");
        let response = self
            .get_json(&format!("/products/{}.json", product_id))
            .await?;

        // The edition size lives on the product as a metafield-style field;
        // absent or non-positive means open edition.
        let size = response
            .get("product")
            .and_then(|p| p.get("edition_size"))
            .and_then(Value::as_i64)
            .filter(|n| *n > 0);
        Ok(size)
    }
}
