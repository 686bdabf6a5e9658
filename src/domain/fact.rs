//! LineItemFact: the normalized, strictly-typed view of one purchased line item.

use crate::domain::{LineItemId, OrderId, ProductId, TimeMs};
use serde::{Deserialize, Serialize};

/// Order-level financial status as reported by the commerce backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialStatus {
    Pending,
    Authorized,
    Paid,
    PartiallyPaid,
    PartiallyRefunded,
    Refunded,
    Voided,
}

impl FinancialStatus {
    /// Parse a status string from an external payload.
    ///
    /// Total: unknown or missing values map to `Pending` so that an
    /// ambiguous order can never be counted as paid.
    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => FinancialStatus::Pending,
            "authorized" => FinancialStatus::Authorized,
            "paid" => FinancialStatus::Paid,
            "partially_paid" => FinancialStatus::PartiallyPaid,
            "partially_refunded" => FinancialStatus::PartiallyRefunded,
            "refunded" => FinancialStatus::Refunded,
            "voided" => FinancialStatus::Voided,
            _ => FinancialStatus::Pending,
        }
    }

    /// Whether the order is in a state that can back an active line item.
    ///
    /// A partially-refunded order was paid: the refunded units are handled
    /// line-by-line from the refund payloads, so the remaining line items
    /// stay backed.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            FinancialStatus::Paid
                | FinancialStatus::PartiallyPaid
                | FinancialStatus::PartiallyRefunded
                | FinancialStatus::Authorized
        )
    }

    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            FinancialStatus::Pending => "pending",
            FinancialStatus::Authorized => "authorized",
            FinancialStatus::Paid => "paid",
            FinancialStatus::PartiallyPaid => "partially_paid",
            FinancialStatus::PartiallyRefunded => "partially_refunded",
            FinancialStatus::Refunded => "refunded",
            FinancialStatus::Voided => "voided",
        }
    }
}

impl std::fmt::Display for FinancialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical observed state of one line item, derived from raw order,
/// line-item, and refund payloads by the normalizer.
///
/// Ephemeral: facts are recomputed from fresh external data on every event
/// and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemFact {
    /// Stable unique identifier for this line item.
    pub line_item_id: LineItemId,
    /// Order this line item belongs to.
    pub order_id: OrderId,
    /// Product this line item purchases.
    pub product_id: ProductId,
    /// Purchased quantity.
    pub quantity: i64,
    /// Quantity refunded across all refunds, clamped to `quantity`.
    pub refunded_quantity: i64,
    /// True if any refund against this line item restocked inventory.
    pub is_restocked: bool,
    /// Order-level financial status.
    pub financial_status: FinancialStatus,
    /// Order cancellation time, if the order was cancelled.
    pub cancelled_at: Option<TimeMs>,
    /// Operator override marking this item removed from the edition.
    pub manual_removal: bool,
    /// The external restock signals disagreed with each other; surfaced as an
    /// info-level audit discrepancy, never used for resolution.
    pub restock_signal_conflict: bool,
}
