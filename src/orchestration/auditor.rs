//! Reconciliation auditor: fetches fresh external state and diffs it against
//! the ledger. Read-only — repairs go through `LedgerService` after operator
//! review.

use crate::datasource::CommerceSource;
use crate::domain::{LineItemFact, OrderId, ProductId, Resolution};
use crate::engine::{diff_order, diff_product, normalizer, resolve, Discrepancy};
use crate::error::LedgerError;
use crate::store::LedgerStore;
use std::sync::Arc;
use tracing::info;

/// Drift detector between the commerce backend and the ledger store.
pub struct Auditor {
    source: Arc<dyn CommerceSource>,
    store: Arc<dyn LedgerStore>,
}

impl Auditor {
    pub fn new(source: Arc<dyn CommerceSource>, store: Arc<dyn LedgerStore>) -> Self {
        Self { source, store }
    }

    /// Audit every line item of a product, including the product-level
    /// numbering invariants (density, duplicates, capacity).
    pub async fn audit_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Discrepancy>, LedgerError> {
        let orders = self.source.fetch_orders_for_product(product_id).await?;
        let edition_size = self.source.fetch_edition_size(product_id).await?;

        let mut expected: Vec<(LineItemFact, Resolution)> = Vec::new();
        for order in &orders {
            for fact in normalizer::facts_for_order(order) {
                if &fact.product_id == product_id {
                    let resolution = resolve(&fact);
                    expected.push((fact, resolution));
                }
            }
        }

        let stored = self.store.entries_for_product(product_id).await?;
        let reports = diff_product(&expected, &stored, edition_size);
        info!(
            product_id = %product_id,
            line_items = expected.len(),
            discrepancies = reports.len(),
            "product audit complete"
        );
        Ok(reports)
    }

    /// Audit one order's line items. Status-level only; numbering invariants
    /// span whole products and are covered by `audit_product`.
    pub async fn audit_order(&self, order_id: &OrderId) -> Result<Vec<Discrepancy>, LedgerError> {
        let order = self.source.fetch_order(order_id).await?;

        let expected: Vec<(LineItemFact, Resolution)> = normalizer::facts_for_order(&order)
            .into_iter()
            .map(|fact| {
                let resolution = resolve(&fact);
                (fact, resolution)
            })
            .collect();

        let stored = self.store.entries_for_order(order_id).await?;
        let reports = diff_order(&expected, &stored);
        info!(
            order_id = %order_id,
            line_items = expected.len(),
            discrepancies = reports.len(),
            "order audit complete"
        );
        Ok(reports)
    }
}
