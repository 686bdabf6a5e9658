//! Edition assigner: plans dense 1..k numbering over a product's entries.
//!
//! Pure planning: callers load the product's full entry set under the
//! per-product lock, run `plan_assignment`, and persist the returned changed
//! rows in one atomic batch. Recomputing from the full set (instead of
//! patching individual numbers) is what makes out-of-order webhook delivery
//! harmless.

use crate::domain::{
    ordering::sort_for_assignment, EntryStatus, LedgerEntry, LineItemId, ProductId, TimeMs,
};
use thiserror::Error;

/// Capacity violation: more active entries than the configured edition size.
///
/// Raised before anything is persisted; the ledger stays in its last
/// consistent state and the surplus needs operator resolution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("edition overflow for product {product_id}: {active_count} active entries exceed size {edition_size} (surplus: {surplus:?})")]
pub struct EditionOverflow {
    pub product_id: ProductId,
    pub edition_size: i64,
    pub active_count: usize,
    /// Newest entries in assignment order; earlier holders are grandfathered.
    pub surplus: Vec<LineItemId>,
}

/// Result of one assignment pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentOutcome {
    /// Rows whose number, total, or timestamp changed; empty when the set was
    /// already consistent.
    pub changed: Vec<LedgerEntry>,
    /// Count of active entries after the pass.
    pub active_count: usize,
    /// Displayed edition total: the configured size, or the active count for
    /// an open edition.
    pub edition_total: i64,
}

impl AssignmentOutcome {
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Plan dense sequential numbering for one product's full entry set.
///
/// Active entries are ordered by their stable assignment key (existing
/// number, then created_at, then line_item_id) and renumbered 1..k. Inactive
/// entries get their number and total cleared. Open editions
/// (`edition_size = None`) carry no persisted numbers; any stale numbers
/// left by a removed size config are cleared.
///
/// Overflow is detected before any row is produced, so a failed pass plans
/// no mutations at all.
pub fn plan_assignment(
    product_id: &ProductId,
    entries: &[LedgerEntry],
    edition_size: Option<i64>,
    now: TimeMs,
) -> Result<AssignmentOutcome, EditionOverflow> {
    let mut active: Vec<LedgerEntry> = entries.iter().filter(|e| e.is_active()).cloned().collect();
    let inactive = entries.iter().filter(|e| !e.is_active());

    sort_for_assignment(&mut active);
    let active_count = active.len();

    if let Some(size) = edition_size {
        if (active_count as i64) > size {
            let surplus = active
                .iter()
                .skip(size.max(0) as usize)
                .map(|e| e.line_item_id.clone())
                .collect();
            return Err(EditionOverflow {
                product_id: product_id.clone(),
                edition_size: size,
                active_count,
                surplus,
            });
        }
    }

    let edition_total = edition_size.unwrap_or(active_count as i64);
    let mut changed = Vec::new();

    for (idx, entry) in active.into_iter().enumerate() {
        // Limited editions get persisted numbers; open editions do not.
        let (want_number, want_total) = match edition_size {
            Some(size) => (Some(idx as i64 + 1), Some(size)),
            None => (None, None),
        };
        if entry.edition_number != want_number || entry.edition_total != want_total {
            let mut updated = entry;
            updated.edition_number = want_number;
            updated.edition_total = want_total;
            updated.updated_at = now;
            changed.push(updated);
        }
    }

    for entry in inactive {
        if entry.edition_number.is_some() || entry.edition_total.is_some() {
            let mut updated = entry.clone();
            updated.edition_number = None;
            updated.edition_total = None;
            updated.updated_at = now;
            changed.push(updated);
        }
    }

    Ok(AssignmentOutcome {
        changed,
        active_count,
        edition_total,
    })
}
