pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod store;

pub use config::Config;
pub use datasource::{CommerceError, CommerceSource, MockCommerceSource, RestCommerceSource};
pub use db::{init_db, Repository};
pub use domain::{
    EntryStatus, FinancialStatus, LedgerEntry, LineItemFact, LineItemId, OrderId, ProductId,
    Resolution, StatusReason, TimeMs,
};
pub use engine::{
    Discrepancy, DiscrepancyKind, EditionOverflow, Severity,
};
pub use error::LedgerError;
pub use orchestration::{Auditor, LedgerService};
pub use store::{LedgerStore, LockMode, LockTimeout, MemoryStore, ProductLocks, StoreError};
