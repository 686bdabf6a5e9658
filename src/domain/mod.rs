//! Domain types and determinism layer for the edition ledger.
//!
//! This module provides:
//! - Opaque identifier newtypes for commerce-backend ids
//! - The normalized `LineItemFact` consumed by the status resolver
//! - The persistent `LedgerEntry` carrying status, reason, and edition number
//! - Stable assignment ordering key for deterministic renumbering

pub mod entry;
pub mod fact;
pub mod ordering;
pub mod primitives;

pub use entry::{EntryStatus, LedgerEntry, Resolution, StatusReason};
pub use fact::{FinancialStatus, LineItemFact};
pub use ordering::AssignmentKey;
pub use primitives::{LineItemId, OrderId, ProductId, TimeMs};
