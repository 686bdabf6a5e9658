//! Status resolver: maps a `LineItemFact` to active/inactive with a reason.

use crate::domain::{FinancialStatus, LineItemFact, Resolution, StatusReason};

/// Resolve a line item's status from its observed fact.
///
/// Rules are evaluated in precedence order, first match wins:
/// 1. restocked
/// 2. fully refunded
/// 3. manually removed
/// 4. order cancelled or voided
/// 5. order not settled (pending/refunded financial status)
/// 6. active
///
/// The order matters: a restocked-and-refunded item must carry the
/// `restocked` reason, never get masked as merely unpaid.
pub fn resolve(fact: &LineItemFact) -> Resolution {
    if fact.is_restocked {
        return Resolution::inactive(StatusReason::Restocked);
    }
    if fact.refunded_quantity >= fact.quantity {
        return Resolution::inactive(StatusReason::Refunded);
    }
    if fact.manual_removal {
        return Resolution::inactive(StatusReason::ManuallyRemoved);
    }
    if fact.cancelled_at.is_some() || fact.financial_status == FinancialStatus::Voided {
        return Resolution::inactive(StatusReason::OrderCancelled);
    }
    if !fact.financial_status.is_settled() {
        return Resolution::inactive(StatusReason::OrderUnpaid);
    }
    Resolution::active()
}
