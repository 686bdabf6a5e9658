//! Ledger store abstraction: persistence contract for ledger entries.
//!
//! Implementations must provide point reads, per-product and per-order batch
//! reads, and an atomic all-or-nothing batch upsert. The per-product lock
//! discipline lives in `locks`; every mutation path must hold the product's
//! lock across load, plan, and persist.

use crate::domain::{LedgerEntry, LineItemId, OrderId, ProductId};
use async_trait::async_trait;
use thiserror::Error;

pub mod locks;
pub mod memory;

pub use locks::{LockMode, LockTimeout, ProductLocks};
pub use memory::MemoryStore;

/// Error type for store operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backend rejected the atomic write, e.g. a schema-level constraint
    /// violation from a concurrent mutation. The whole batch was rolled back.
    #[error("persistence conflict: {0}")]
    Conflict(String),
    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Persistence contract for ledger entries.
///
/// Swappable backend (SQL table, in-memory map) as long as `upsert_batch` is
/// atomic: either every row in the batch is visible afterward or none is.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Point read by line-item id.
    async fn get_entry(&self, line_item_id: &LineItemId) -> Result<Option<LedgerEntry>, StoreError>;

    /// All entries for a product, in no particular order.
    async fn entries_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<LedgerEntry>, StoreError>;

    /// All entries for an order, in no particular order.
    async fn entries_for_order(&self, order_id: &OrderId) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Atomically upsert one assignment pass's changed rows for a product.
    ///
    /// All-or-nothing: a failure leaves every row untouched. Callers must
    /// hold the product's lock.
    async fn upsert_batch(
        &self,
        product_id: &ProductId,
        entries: &[LedgerEntry],
    ) -> Result<(), StoreError>;
}
