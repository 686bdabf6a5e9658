//! Reconciliation auditor: pure diff between freshly-resolved facts and
//! stored ledger entries. Read-only; repair is an operator decision.

use crate::domain::{LedgerEntry, LineItemFact, LineItemId, Resolution};
use std::collections::{HashMap, HashSet};

/// How bad a discrepancy is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Stale denormalized data or ambiguous upstream signals; review at leisure.
    Info,
    /// Numbering invariant violated (gap, duplicate, overflow).
    Warning,
    /// Wrong active/inactive call; may indicate a resolver bug, so repair
    /// requires explicit operator confirmation.
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// What kind of drift was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscrepancyKind {
    /// Stored status/reason disagrees with the freshly-resolved one.
    StatusMismatch,
    /// The commerce backend knows a line item the ledger never recorded.
    MissingEntry,
    /// Active entry without a number, or inactive entry holding one.
    NumberPresence,
    /// Active-set numbers are not exactly {1..k}.
    NumberingGap,
    /// Two active entries share a number.
    DuplicateNumber,
    /// More active entries than the configured edition size.
    CapacityExceeded,
    /// Denormalized edition_total no longer matches the configuration.
    StaleTotal,
    /// Upstream restock signals disagreed with each other.
    AmbiguousRestockSignal,
}

impl DiscrepancyKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiscrepancyKind::StatusMismatch | DiscrepancyKind::MissingEntry => Severity::Critical,
            DiscrepancyKind::NumberPresence
            | DiscrepancyKind::NumberingGap
            | DiscrepancyKind::DuplicateNumber
            | DiscrepancyKind::CapacityExceeded => Severity::Warning,
            DiscrepancyKind::StaleTotal | DiscrepancyKind::AmbiguousRestockSignal => Severity::Info,
        }
    }
}

/// One observed divergence between external truth and the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discrepancy {
    pub line_item_id: LineItemId,
    pub kind: DiscrepancyKind,
    pub severity: Severity,
    pub expected: String,
    pub actual: String,
}

impl Discrepancy {
    fn new(
        line_item_id: LineItemId,
        kind: DiscrepancyKind,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Discrepancy {
            line_item_id,
            severity: kind.severity(),
            kind,
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Diff one order's freshly-resolved facts against its stored entries.
///
/// Status-level only: numbering is a product-level property and is checked by
/// `diff_product`.
pub fn diff_order(
    expected: &[(LineItemFact, Resolution)],
    stored: &[LedgerEntry],
) -> Vec<Discrepancy> {
    let by_id: HashMap<&str, &LedgerEntry> = stored
        .iter()
        .map(|e| (e.line_item_id.as_str(), e))
        .collect();

    let mut reports = Vec::new();
    for (fact, resolution) in expected {
        status_checks(fact, resolution, by_id.get(fact.line_item_id.as_str()).copied(), &mut reports);
    }
    reports
}

/// Diff a product's full expected state against its stored entries,
/// including the numbering invariants.
pub fn diff_product(
    expected: &[(LineItemFact, Resolution)],
    stored: &[LedgerEntry],
    edition_size: Option<i64>,
) -> Vec<Discrepancy> {
    let mut reports = diff_order(expected, stored);
    numbering_checks(stored, edition_size, &mut reports);
    reports
}

fn status_checks(
    fact: &LineItemFact,
    resolution: &Resolution,
    stored: Option<&LedgerEntry>,
    reports: &mut Vec<Discrepancy>,
) {
    let Some(entry) = stored else {
        reports.push(Discrepancy::new(
            fact.line_item_id.clone(),
            DiscrepancyKind::MissingEntry,
            resolution.to_string(),
            "no ledger entry",
        ));
        return;
    };

    if entry.status != resolution.status || entry.status_reason != resolution.reason {
        reports.push(Discrepancy::new(
            entry.line_item_id.clone(),
            DiscrepancyKind::StatusMismatch,
            resolution.to_string(),
            format!("{}/{}", entry.status, entry.status_reason),
        ));
    }

    if fact.restock_signal_conflict {
        reports.push(Discrepancy::new(
            entry.line_item_id.clone(),
            DiscrepancyKind::AmbiguousRestockSignal,
            "consistent restock signals",
            "refund payloads carry conflicting restock signals",
        ));
    }
}

fn numbering_checks(
    stored: &[LedgerEntry],
    edition_size: Option<i64>,
    reports: &mut Vec<Discrepancy>,
) {
    let active: Vec<&LedgerEntry> = stored.iter().filter(|e| e.is_active()).collect();
    let limited = edition_size.is_some();

    for entry in stored {
        let number_expected = entry.is_active() && limited;
        if number_expected && entry.edition_number.is_none() {
            reports.push(Discrepancy::new(
                entry.line_item_id.clone(),
                DiscrepancyKind::NumberPresence,
                "an edition number",
                "none",
            ));
        }
        if !entry.is_active() && entry.edition_number.is_some() {
            reports.push(Discrepancy::new(
                entry.line_item_id.clone(),
                DiscrepancyKind::NumberPresence,
                "no edition number on inactive entry",
                format!("{:?}", entry.edition_number),
            ));
        }
    }

    if let Some(size) = edition_size {
        if active.len() as i64 > size {
            for entry in active.iter().skip(size.max(0) as usize) {
                reports.push(Discrepancy::new(
                    entry.line_item_id.clone(),
                    DiscrepancyKind::CapacityExceeded,
                    format!("at most {} active entries", size),
                    format!("{} active entries", active.len()),
                ));
            }
        }

        for entry in &active {
            if entry.edition_total.is_some() && entry.edition_total != Some(size) {
                reports.push(Discrepancy::new(
                    entry.line_item_id.clone(),
                    DiscrepancyKind::StaleTotal,
                    format!("edition_total {}", size),
                    format!("{:?}", entry.edition_total),
                ));
            }
        }
    }

    if limited {
        let mut seen: HashSet<i64> = HashSet::new();
        let mut numbers: Vec<(i64, &LedgerEntry)> = Vec::new();
        for entry in &active {
            if let Some(n) = entry.edition_number {
                if seen.insert(n) {
                    numbers.push((n, entry));
                } else {
                    reports.push(Discrepancy::new(
                        entry.line_item_id.clone(),
                        DiscrepancyKind::DuplicateNumber,
                        "a unique edition number",
                        format!("number {} held by multiple entries", n),
                    ));
                }
            }
        }

        // Density: the distinct numbers must be exactly {1..k}. A gap is
        // attributed to the entry just past it.
        numbers.sort_by_key(|(n, _)| *n);
        let mut prev = 0i64;
        for (n, entry) in numbers {
            if n != prev + 1 {
                reports.push(Discrepancy::new(
                    entry.line_item_id.clone(),
                    DiscrepancyKind::NumberingGap,
                    format!("number {}", prev + 1),
                    format!("number {}", n),
                ));
            }
            prev = n;
        }
    }
}
