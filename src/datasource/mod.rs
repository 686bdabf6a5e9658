//! Commerce-backend abstraction for fetching fresh order and product data.
//!
//! Payloads stay raw `serde_json::Value`s until they cross the normalizer
//! boundary; implementations only handle transport, retries, and rate limits.

use crate::domain::{OrderId, ProductId};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

pub mod mock;
pub mod rest;

pub use mock::MockCommerceSource;
pub use rest::RestCommerceSource;

/// Source of truth for orders, refunds, and edition configuration.
#[async_trait]
pub trait CommerceSource: Send + Sync + fmt::Debug {
    /// Fetch one order payload, with `line_items` and `refunds` embedded.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Value, CommerceError>;

    /// Fetch every order payload containing line items for a product.
    async fn fetch_orders_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Value>, CommerceError>;

    /// Fetch the configured edition size for a product.
    ///
    /// `None` means open edition (no numbering). Externally managed and
    /// read-only to this crate.
    async fn fetch_edition_size(&self, product_id: &ProductId)
        -> Result<Option<i64>, CommerceError>;
}

/// Error type for commerce-backend operations.
#[derive(Debug, Clone)]
pub enum CommerceError {
    /// Network error (e.g., connection timeout, DNS failure)
    Network(String),
    /// HTTP error (e.g., 404 unknown order, 5xx server error)
    Http { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    Parse(String),
    /// Rate limit exceeded (caller should back off)
    RateLimited,
    /// Other error
    Other(String),
}

impl fmt::Display for CommerceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommerceError::Network(msg) => write!(f, "network error: {}", msg),
            CommerceError::Http { status, message } => {
                write!(f, "http error {}: {}", status, message)
            }
            CommerceError::Parse(msg) => write!(f, "parse error: {}", msg),
            CommerceError::RateLimited => write!(f, "rate limited"),
            CommerceError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CommerceError {}
