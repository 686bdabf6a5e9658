//! In-memory ledger store for tests and the concurrency properties.

use super::{LedgerStore, StoreError};
use crate::domain::{LedgerEntry, LineItemId, OrderId, ProductId};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Map-backed `LedgerStore`. Batch upserts swap the whole map under a write
/// lock, so atomicity holds trivially.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<LineItemId, LedgerEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry directly, bypassing the assignment path (test setup).
    pub async fn seed(&self, entry: LedgerEntry) {
        self.entries
            .write()
            .await
            .insert(entry.line_item_id.clone(), entry);
    }

    /// Total entry count across all products.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn get_entry(&self, line_item_id: &LineItemId) -> Result<Option<LedgerEntry>, StoreError> {
        Ok(self.entries.read().await.get(line_item_id).cloned())
    }

    async fn entries_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .values()
            .filter(|e| &e.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn entries_for_order(&self, order_id: &OrderId) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .values()
            .filter(|e| &e.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn upsert_batch(
        &self,
        _product_id: &ProductId,
        entries: &[LedgerEntry],
    ) -> Result<(), StoreError> {
        let mut map = self.entries.write().await;
        for entry in entries {
            map.insert(entry.line_item_id.clone(), entry.clone());
        }
        Ok(())
    }
}
