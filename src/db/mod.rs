//! SQLite persistence for the ledger.
//!
//! This module provides:
//! - Database initialization and migrations
//! - SQLite pragma configuration
//! - The `Repository` implementation of `LedgerStore`

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::Repository;
