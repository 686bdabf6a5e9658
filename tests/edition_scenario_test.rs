//! End-to-end lifecycle of a size-3 limited edition: purchases, a refund
//! that resequences, a backfill, and an overflow.

use edition_ledger::store::{LockMode, MemoryStore, ProductLocks};
use edition_ledger::{
    EntryStatus, LedgerError, LedgerService, LedgerStore, LineItemId, ProductId, StatusReason,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn service(store: Arc<MemoryStore>) -> LedgerService {
    LedgerService::new(store, Arc::new(ProductLocks::new()), LockMode::Wait)
}

fn paid_order(id: i64) -> Value {
    json!({ "id": id, "financial_status": "paid" })
}

fn line_item(id: i64) -> Value {
    json!({ "id": id, "product_id": 500, "quantity": 1 })
}

async fn number_of(store: &MemoryStore, li: i64) -> Option<i64> {
    store
        .get_entry(&LineItemId::new(li.to_string()))
        .await
        .unwrap()
        .unwrap()
        .edition_number
}

#[tokio::test]
async fn test_limited_edition_lifecycle() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());
    let size = Some(3);

    // L1, L2, L3 purchased in order: numbered 1, 2, 3.
    for (order_id, li) in [(1, 1001), (2, 1002), (3, 1003)] {
        svc.record_event(&paid_order(order_id), &line_item(li), &[], size)
            .await
            .unwrap();
    }
    assert_eq!(number_of(&store, 1001).await, Some(1));
    assert_eq!(number_of(&store, 1002).await, Some(2));
    assert_eq!(number_of(&store, 1003).await, Some(3));

    // L2 fully refunded: L1 keeps 1, L3 resequences to 2, no gap.
    let refunds = vec![json!({
        "refund_line_items": [{ "line_item_id": 1002, "quantity": 1 }]
    })];
    let outcome = svc
        .record_event(&paid_order(2), &line_item(1002), &refunds, size)
        .await
        .unwrap();
    assert_eq!(outcome.resolution.reason, StatusReason::Refunded);
    assert_eq!(number_of(&store, 1001).await, Some(1));
    assert_eq!(number_of(&store, 1003).await, Some(2));

    let l2 = store
        .get_entry(&LineItemId::new("1002"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(l2.status, EntryStatus::Inactive);
    assert_eq!(l2.edition_number, None);
    assert_eq!(l2.edition_total, None);

    // L4 purchased into the freed slot: numbered 3.
    svc.record_event(&paid_order(4), &line_item(1004), &[], size)
        .await
        .unwrap();
    assert_eq!(number_of(&store, 1001).await, Some(1));
    assert_eq!(number_of(&store, 1003).await, Some(2));
    assert_eq!(number_of(&store, 1004).await, Some(3));

    // L5 purchased at capacity: overflow names L5 as surplus, existing
    // holders keep their numbers, and nothing about L5 is committed.
    let err = svc
        .record_event(&paid_order(5), &line_item(1005), &[], size)
        .await
        .unwrap_err();
    match err {
        LedgerError::Overflow(overflow) => {
            assert_eq!(overflow.product_id, ProductId::new("500"));
            assert_eq!(overflow.edition_size, 3);
            assert_eq!(overflow.active_count, 4);
            assert_eq!(overflow.surplus, vec![LineItemId::new("1005")]);
        }
        other => panic!("expected EditionOverflow, got {:?}", other),
    }
    assert!(store
        .get_entry(&LineItemId::new("1005"))
        .await
        .unwrap()
        .is_none());
    assert_eq!(number_of(&store, 1001).await, Some(1));
    assert_eq!(number_of(&store, 1003).await, Some(2));
    assert_eq!(number_of(&store, 1004).await, Some(3));
}

#[tokio::test]
async fn test_partial_refund_keeps_item_active() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());

    let li = json!({ "id": 2001, "product_id": 500, "quantity": 2 });
    svc.record_event(&paid_order(1), &li, &[], Some(3))
        .await
        .unwrap();

    // One of two units refunded without restock: still active, still #1.
    let refunds = vec![json!({
        "refund_line_items": [{ "line_item_id": 2001, "quantity": 1, "restock_type": "no_restock" }]
    })];
    let outcome = svc
        .record_event(&paid_order(1), &li, &refunds, Some(3))
        .await
        .unwrap();
    assert_eq!(outcome.resolution.status, EntryStatus::Active);
    assert_eq!(outcome.resolution.reason, StatusReason::Active);
    assert!(!outcome.status_changed);
    assert_eq!(number_of(&store, 2001).await, Some(1));
}

#[tokio::test]
async fn test_restocked_partial_refund_deactivates() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());

    let li = json!({ "id": 2001, "product_id": 500, "quantity": 2 });
    svc.record_event(&paid_order(1), &li, &[], Some(3))
        .await
        .unwrap();

    // Restock wins over the partial-refund rule: the sale is voided.
    let refunds = vec![json!({
        "refund_line_items": [{ "line_item_id": 2001, "quantity": 1, "restocked": true }]
    })];
    let outcome = svc
        .record_event(&paid_order(1), &li, &refunds, Some(3))
        .await
        .unwrap();
    assert_eq!(outcome.resolution.reason, StatusReason::Restocked);
    assert_eq!(number_of(&store, 2001).await, None);
}

#[tokio::test]
async fn test_item_can_reactivate_after_unpaid_order_settles() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());
    let li = line_item(3001);

    let pending = json!({ "id": 7, "financial_status": "pending" });
    let outcome = svc.record_event(&pending, &li, &[], Some(3)).await.unwrap();
    assert_eq!(outcome.resolution.reason, StatusReason::OrderUnpaid);
    assert_eq!(number_of(&store, 3001).await, None);

    let paid = json!({ "id": 7, "financial_status": "paid" });
    let outcome = svc.record_event(&paid, &li, &[], Some(3)).await.unwrap();
    assert!(outcome.status_changed);
    assert_eq!(outcome.resolution.status, EntryStatus::Active);
    assert_eq!(number_of(&store, 3001).await, Some(1));
}

#[tokio::test]
async fn test_open_edition_counts_without_numbering() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());

    for (order_id, li) in [(1, 4001), (2, 4002)] {
        let outcome = svc
            .record_event(&paid_order(order_id), &line_item(li), &[], None)
            .await
            .unwrap();
        assert_eq!(outcome.assignment.edition_total, outcome.assignment.active_count as i64);
    }
    assert_eq!(number_of(&store, 4001).await, None);
    assert_eq!(number_of(&store, 4002).await, None);
}
