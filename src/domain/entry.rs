//! LedgerEntry: the persistent record of one line item's edition standing.

use crate::domain::{LineItemId, OrderId, ProductId, TimeMs};
use serde::{Deserialize, Serialize};

/// Whether a line item currently counts toward its product's edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Active,
    Inactive,
}

impl EntryStatus {
    /// Stable string form for persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Active => "active",
            EntryStatus::Inactive => "inactive",
        }
    }

    /// Parse the persisted string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(EntryStatus::Active),
            "inactive" => Some(EntryStatus::Inactive),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why an entry holds its current status. Every mutation is attributable to
/// exactly one reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusReason {
    Refunded,
    Restocked,
    ManuallyRemoved,
    OrderCancelled,
    OrderUnpaid,
    Active,
}

impl StatusReason {
    /// Stable string form for persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusReason::Refunded => "refunded",
            StatusReason::Restocked => "restocked",
            StatusReason::ManuallyRemoved => "manually_removed",
            StatusReason::OrderCancelled => "order_cancelled",
            StatusReason::OrderUnpaid => "order_unpaid",
            StatusReason::Active => "active",
        }
    }

    /// Parse the persisted string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "refunded" => Some(StatusReason::Refunded),
            "restocked" => Some(StatusReason::Restocked),
            "manually_removed" => Some(StatusReason::ManuallyRemoved),
            "order_cancelled" => Some(StatusReason::OrderCancelled),
            "order_unpaid" => Some(StatusReason::OrderUnpaid),
            "active" => Some(StatusReason::Active),
            _ => None,
        }
    }
}

impl std::fmt::Display for StatusReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A resolved status with its reason code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub status: EntryStatus,
    pub reason: StatusReason,
}

impl Resolution {
    pub fn active() -> Self {
        Resolution {
            status: EntryStatus::Active,
            reason: StatusReason::Active,
        }
    }

    pub fn inactive(reason: StatusReason) -> Self {
        Resolution {
            status: EntryStatus::Inactive,
            reason,
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.status, self.reason)
    }
}

/// Persistent ledger row, one per line item. Never hard-deleted; only
/// `status`, `status_reason`, `edition_number`, `edition_total`, and
/// `updated_at` change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique key.
    pub line_item_id: LineItemId,
    pub product_id: ProductId,
    pub order_id: OrderId,
    pub status: EntryStatus,
    pub status_reason: StatusReason,
    /// Sequential 1..k number; present only while active in a limited edition.
    pub edition_number: Option<i64>,
    /// Denormalized edition size snapshot at assignment time, for display.
    pub edition_total: Option<i64>,
    pub created_at: TimeMs,
    pub updated_at: TimeMs,
}

impl LedgerEntry {
    /// Create a fresh, unnumbered entry for a newly observed line item.
    pub fn new(
        line_item_id: LineItemId,
        product_id: ProductId,
        order_id: OrderId,
        resolution: Resolution,
        now: TimeMs,
    ) -> Self {
        LedgerEntry {
            line_item_id,
            product_id,
            order_id,
            status: resolution.status,
            status_reason: resolution.reason,
            edition_number: None,
            edition_total: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == EntryStatus::Active
    }
}
