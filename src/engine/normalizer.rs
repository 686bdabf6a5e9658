//! Source event normalizer: the single boundary between raw commerce-backend
//! JSON and the strictly-typed `LineItemFact`.
//!
//! Total over arbitrary input: missing or malformed fields fall back to
//! conservative values (unknown financial status is `pending`, missing
//! quantity is 0), so an ambiguous payload can never produce a false-active
//! status. Nothing downstream of this module touches raw payload shapes.

use crate::domain::{FinancialStatus, LineItemFact, LineItemId, OrderId, ProductId, TimeMs};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::warn;

/// Normalize one line item into a fact.
///
/// `raw_refunds` must be the order's full refund list, not just the latest
/// refund: refunded quantity accumulates across all refunds touching this
/// line item, and a restock signal on any of them marks the item restocked.
pub fn normalize(raw_order: &Value, raw_line_item: &Value, raw_refunds: &[Value]) -> LineItemFact {
    let order_id = OrderId::new(id_string(raw_order.get("id")).unwrap_or_default());
    let line_item_id = line_item_id(raw_line_item, &order_id);
    let product_id = ProductId::new(
        id_string(raw_line_item.get("product_id"))
            .or_else(|| id_string(raw_line_item.get("productId")))
            .unwrap_or_default(),
    );

    let quantity = raw_line_item
        .get("quantity")
        .and_then(Value::as_i64)
        .unwrap_or(0)
        .max(0);

    let (mut refunded_quantity, is_restocked, restock_signal_conflict) =
        scan_refunds(raw_refunds, &line_item_id);

    if refunded_quantity > quantity {
        warn!(
            line_item_id = %line_item_id,
            refunded_quantity,
            quantity,
            "refunded quantity exceeds purchased quantity; clamping"
        );
        refunded_quantity = quantity;
    }

    let financial_status = raw_order
        .get("financial_status")
        .and_then(Value::as_str)
        .map(FinancialStatus::parse)
        .unwrap_or(FinancialStatus::Pending);

    let cancelled_at = raw_order
        .get("cancelled_at")
        .filter(|v| !v.is_null())
        .map(parse_timestamp);

    let manual_removal = manual_removal_flag(raw_line_item);

    LineItemFact {
        line_item_id,
        order_id,
        product_id,
        quantity,
        refunded_quantity,
        is_restocked,
        financial_status,
        cancelled_at,
        manual_removal,
        restock_signal_conflict,
    }
}

/// Normalize every line item of an order payload that embeds `line_items`
/// and `refunds` arrays (the webhook shape).
pub fn facts_for_order(raw_order: &Value) -> Vec<LineItemFact> {
    let line_items = raw_order
        .get("line_items")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let refunds = raw_order
        .get("refunds")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    line_items
        .iter()
        .map(|li| normalize(raw_order, li, &refunds))
        .collect()
}

/// Accumulate refunded quantity and restock signals for one line item across
/// all refunds. Returns (refunded_quantity, is_restocked, signal_conflict).
fn scan_refunds(raw_refunds: &[Value], line_item_id: &LineItemId) -> (i64, bool, bool) {
    let mut refunded = 0i64;
    let mut restock_positive = false;
    let mut restock_negative = false;

    for refund in raw_refunds {
        let refund_line_items = refund
            .get("refund_line_items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        for rli in refund_line_items {
            let target = id_string(rli.get("line_item_id"))
                .or_else(|| id_string(rli.get("line_item").and_then(|li| li.get("id"))));
            if target.as_deref() != Some(line_item_id.as_str()) {
                continue;
            }

            refunded += rli.get("quantity").and_then(Value::as_i64).unwrap_or(0).max(0);

            // The upstream restock signal is ambiguous: different API
            // versions report an explicit boolean, a restock_type string,
            // or only a status string. Any positive signal marks the item
            // restocked; a positive alongside an explicit no_restock is
            // flagged for audit review.
            let explicit_bool = rli.get("restocked").and_then(Value::as_bool);
            let restock_type = rli.get("restock_type").and_then(Value::as_str);
            let status_mentions_restock = ["status", "fulfillment_status"].iter().any(|key| {
                rli.get(*key)
                    .and_then(Value::as_str)
                    .map(|s| s.contains("restock"))
                    .unwrap_or(false)
            });

            let positive = explicit_bool == Some(true)
                || matches!(restock_type, Some(t) if !t.is_empty() && t != "no_restock" && t != "none")
                || status_mentions_restock;
            let negative =
                explicit_bool == Some(false) || matches!(restock_type, Some("no_restock"));

            restock_positive |= positive;
            restock_negative |= negative;
        }
    }

    let conflict = restock_positive && restock_negative;
    if conflict {
        warn!(
            line_item_id = %line_item_id,
            "conflicting restock signals across refunds"
        );
    }

    (refunded, restock_positive, conflict)
}

/// Line-item id, with a stable hash-derived fallback when the payload has
/// none, so repeated observations of the same payload map to one entry.
fn line_item_id(raw_line_item: &Value, order_id: &OrderId) -> LineItemId {
    if let Some(id) = id_string(raw_line_item.get("id")) {
        return LineItemId::new(id);
    }

    let mut hasher = Sha256::new();
    hasher.update(order_id.as_str());
    for key in ["sku", "variant_id", "product_id", "title"] {
        if let Some(v) = raw_line_item.get(key) {
            hasher.update(key);
            hasher.update(v.to_string());
        }
    }
    LineItemId::new(format!("derived:{}", hex::encode(&hasher.finalize()[..12])))
}

/// Operator override: a top-level flag or a `_edition_removed` line-item
/// property set by the admin tool.
fn manual_removal_flag(raw_line_item: &Value) -> bool {
    if raw_line_item
        .get("manually_removed")
        .and_then(Value::as_bool)
        == Some(true)
    {
        return true;
    }

    raw_line_item
        .get("properties")
        .and_then(Value::as_array)
        .map(|props| {
            props.iter().any(|p| {
                p.get("name").and_then(Value::as_str) == Some("_edition_removed")
                    && matches!(
                        p.get("value"),
                        Some(Value::Bool(true)) | Some(Value::String(_))
                    )
                    && p.get("value").and_then(Value::as_str) != Some("false")
            })
        })
        .unwrap_or(false)
}

/// Accept ids as JSON numbers or strings.
fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse an RFC 3339 timestamp; an unparseable but present value maps to
/// epoch so the cancellation is still honored.
fn parse_timestamp(value: &Value) -> TimeMs {
    value
        .as_str()
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| TimeMs::new(dt.timestamp_millis()))
        .unwrap_or(TimeMs::new(0))
}
