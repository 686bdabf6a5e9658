//! Orchestration: the I/O-bearing entry points tying normalizer, resolver,
//! assigner, locks, and store together.

pub mod auditor;
pub mod ledger;

pub use auditor::Auditor;
pub use ledger::{AssignmentSummary, LedgerService, RecordOutcome};
