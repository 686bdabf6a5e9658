//! Pure computation engine for deterministic edition-ledger logic.
//!
//! Everything in this module is synchronous and side-effect free: the
//! normalizer turns raw commerce payloads into facts, the resolver maps a
//! fact to a status, the assigner plans dense 1..k numbering, and the
//! auditor diffs expected against stored state. All I/O lives in
//! `orchestration` and `store`.

pub mod assigner;
pub mod auditor;
pub mod normalizer;
pub mod resolver;

pub use assigner::{plan_assignment, AssignmentOutcome, EditionOverflow};
pub use auditor::{diff_order, diff_product, Discrepancy, DiscrepancyKind, Severity};
pub use normalizer::{facts_for_order, normalize};
pub use resolver::resolve;
