//! LedgerService: the single write path for every status change.
//!
//! Webhook handlers, admin actions, and repair tooling all funnel through
//! `record_event`/`record_order`/`reassign`, so status resolution and
//! numbering happen in exactly one place and always under the product lock.

use crate::domain::{LedgerEntry, LineItemFact, ProductId, Resolution, TimeMs};
use crate::engine::{normalizer, plan_assignment, resolve};
use crate::error::LedgerError;
use crate::store::{LedgerStore, LockMode, ProductLocks};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// What one committed assignment pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentSummary {
    pub product_id: ProductId,
    pub active_count: usize,
    pub edition_total: i64,
    /// Rows written by the atomic batch; 0 means the pass was a no-op.
    pub rows_written: usize,
}

/// Outcome of recording one line-item event.
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub fact: LineItemFact,
    pub resolution: Resolution,
    /// False when the event changed nothing (idempotent redelivery).
    pub status_changed: bool,
    pub assignment: AssignmentSummary,
}

/// The consolidated edition-ledger write path.
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    locks: Arc<ProductLocks>,
    lock_mode: LockMode,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>, locks: Arc<ProductLocks>, lock_mode: LockMode) -> Self {
        Self {
            store,
            locks,
            lock_mode,
        }
    }

    /// Record one line item's observed state and renumber its product.
    ///
    /// Normalizes, resolves, and then — under the product lock — loads the
    /// full entry set, merges the change, plans assignment, and persists the
    /// changed rows as one atomic batch. An `EditionOverflow` aborts the
    /// whole pass: not even the status flip is committed.
    pub async fn record_event(
        &self,
        raw_order: &Value,
        raw_line_item: &Value,
        raw_refunds: &[Value],
        edition_size: Option<i64>,
    ) -> Result<RecordOutcome, LedgerError> {
        let fact = normalizer::normalize(raw_order, raw_line_item, raw_refunds);
        let resolution = resolve(&fact);
        let product_id = fact.product_id.clone();

        let _guard = self.locks.acquire(&product_id, self.lock_mode).await?;

        let mut entries = self.store.entries_for_product(&product_id).await?;
        let now = TimeMs::now();
        let status_changed = merge_fact(&mut entries, &fact, resolution, now);

        let summary = self
            .commit_assignment(&product_id, entries, edition_size, status_changed, &fact, now)
            .await?;

        Ok(RecordOutcome {
            fact,
            resolution,
            status_changed,
            assignment: summary,
        })
    }

    /// Record every line item of an order payload (the webhook shape),
    /// grouped per product so each product is loaded, planned, and persisted
    /// once under its own lock.
    pub async fn record_order(
        &self,
        raw_order: &Value,
        edition_sizes: &HashMap<ProductId, Option<i64>>,
    ) -> Result<Vec<RecordOutcome>, LedgerError> {
        let facts = normalizer::facts_for_order(raw_order);
        let mut by_product: HashMap<ProductId, Vec<LineItemFact>> = HashMap::new();
        for fact in facts {
            by_product.entry(fact.product_id.clone()).or_default().push(fact);
        }

        let mut outcomes = Vec::new();
        for (product_id, facts) in by_product {
            let edition_size = edition_sizes.get(&product_id).copied().flatten();
            let _guard = self.locks.acquire(&product_id, self.lock_mode).await?;

            let mut entries = self.store.entries_for_product(&product_id).await?;
            let now = TimeMs::now();

            let mut resolved = Vec::new();
            let mut any_changed = false;
            for fact in facts {
                let resolution = resolve(&fact);
                let changed = merge_fact(&mut entries, &fact, resolution, now);
                any_changed |= changed;
                resolved.push((fact, resolution, changed));
            }

            let probe = resolved[0].0.clone();
            let summary = self
                .commit_assignment(&product_id, entries, edition_size, any_changed, &probe, now)
                .await?;

            for (fact, resolution, status_changed) in resolved {
                outcomes.push(RecordOutcome {
                    fact,
                    resolution,
                    status_changed,
                    assignment: summary.clone(),
                });
            }
        }
        Ok(outcomes)
    }

    /// Re-run assignment for a product without any new event: the repair /
    /// admin entry point, and the recovery path after an operator resolves
    /// an overflow.
    pub async fn reassign(
        &self,
        product_id: &ProductId,
        edition_size: Option<i64>,
    ) -> Result<AssignmentSummary, LedgerError> {
        let _guard = self.locks.acquire(product_id, self.lock_mode).await?;
        let entries = self.store.entries_for_product(product_id).await?;
        let now = TimeMs::now();

        let outcome = plan_assignment(product_id, &entries, edition_size, now)?;
        if !outcome.is_noop() {
            self.store.upsert_batch(product_id, &outcome.changed).await?;
            info!(
                product_id = %product_id,
                rows = outcome.changed.len(),
                active = outcome.active_count,
                "reassigned edition numbers"
            );
        }

        Ok(AssignmentSummary {
            product_id: product_id.clone(),
            active_count: outcome.active_count,
            edition_total: outcome.edition_total,
            rows_written: outcome.changed.len(),
        })
    }

    /// Plan and persist under an already-held lock. The batch is the union
    /// of the planner's changed rows and any entries whose status flipped
    /// without their number moving.
    async fn commit_assignment(
        &self,
        product_id: &ProductId,
        entries: Vec<LedgerEntry>,
        edition_size: Option<i64>,
        status_changed: bool,
        fact: &LineItemFact,
        now: TimeMs,
    ) -> Result<AssignmentSummary, LedgerError> {
        let outcome = plan_assignment(product_id, &entries, edition_size, now)?;

        let mut batch = outcome.changed.clone();
        if status_changed {
            for entry in &entries {
                let touched = entry.updated_at == now;
                let in_batch = batch.iter().any(|b| b.line_item_id == entry.line_item_id);
                if touched && !in_batch {
                    batch.push(entry.clone());
                }
            }
        }

        if batch.is_empty() {
            debug!(
                product_id = %product_id,
                line_item_id = %fact.line_item_id,
                "event changed nothing; skipping write"
            );
        } else {
            self.store.upsert_batch(product_id, &batch).await?;
            info!(
                product_id = %product_id,
                line_item_id = %fact.line_item_id,
                rows = batch.len(),
                active = outcome.active_count,
                "committed assignment pass"
            );
        }

        Ok(AssignmentSummary {
            product_id: product_id.clone(),
            active_count: outcome.active_count,
            edition_total: outcome.edition_total,
            rows_written: batch.len(),
        })
    }
}

/// Merge a resolved fact into the in-memory entry set. Returns true when the
/// set actually changed (new entry, or status/reason transition).
fn merge_fact(
    entries: &mut Vec<LedgerEntry>,
    fact: &LineItemFact,
    resolution: Resolution,
    now: TimeMs,
) -> bool {
    match entries
        .iter_mut()
        .find(|e| e.line_item_id == fact.line_item_id)
    {
        Some(entry) => {
            if entry.status == resolution.status && entry.status_reason == resolution.reason {
                return false;
            }
            entry.status = resolution.status;
            entry.status_reason = resolution.reason;
            entry.updated_at = now;
            true
        }
        None => {
            entries.push(LedgerEntry::new(
                fact.line_item_id.clone(),
                fact.product_id.clone(),
                fact.order_id.clone(),
                resolution,
                now,
            ));
            true
        }
    }
}
