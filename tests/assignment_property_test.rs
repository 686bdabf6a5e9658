//! Property tests over the assignment planner: density, idempotence, and
//! grandfathering hold for arbitrary activate/deactivate sequences.

use edition_ledger::domain::{
    LedgerEntry, LineItemId, OrderId, ProductId, Resolution, StatusReason, TimeMs,
};
use edition_ledger::engine::plan_assignment;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn pid() -> ProductId {
    ProductId::new("p-1")
}

/// One status-change event against a small pool of line items.
#[derive(Debug, Clone)]
enum Event {
    Activate(usize),
    Deactivate(usize),
}

fn event_strategy(pool: usize) -> impl Strategy<Value = Event> {
    prop_oneof![
        (0..pool).prop_map(Event::Activate),
        (0..pool).prop_map(Event::Deactivate),
    ]
}

/// Drive a sequence of events through the planner the way the service does:
/// merge the status change, plan, apply the changed rows. Overflowing events
/// are rolled back (the merge is undone), mirroring the abort-on-overflow
/// write path.
fn run_events(events: &[Event], edition_size: Option<i64>) -> Vec<LedgerEntry> {
    let mut entries: Vec<LedgerEntry> = Vec::new();
    let mut clock = 0i64;

    for event in events {
        clock += 1;
        let now = TimeMs::new(clock);
        let (idx, resolution) = match event {
            Event::Activate(i) => (*i, Resolution::active()),
            Event::Deactivate(i) => (*i, Resolution::inactive(StatusReason::Refunded)),
        };
        let id = LineItemId::new(format!("li-{}", idx));

        let snapshot = entries.clone();
        match entries.iter_mut().find(|e| e.line_item_id == id) {
            Some(entry) => {
                if entry.status == resolution.status && entry.status_reason == resolution.reason {
                    continue;
                }
                entry.status = resolution.status;
                entry.status_reason = resolution.reason;
                entry.updated_at = now;
            }
            None => entries.push(LedgerEntry::new(
                id,
                pid(),
                OrderId::new("o-1"),
                resolution,
                now,
            )),
        }

        match plan_assignment(&pid(), &entries, edition_size, now) {
            Ok(outcome) => {
                for changed in outcome.changed {
                    let slot = entries
                        .iter_mut()
                        .find(|e| e.line_item_id == changed.line_item_id)
                        .expect("planner only changes known entries");
                    *slot = changed;
                }
            }
            Err(_overflow) => {
                entries = snapshot;
            }
        }
    }

    entries
}

fn active_numbers(entries: &[LedgerEntry]) -> Vec<i64> {
    entries
        .iter()
        .filter(|e| e.is_active())
        .map(|e| e.edition_number.expect("active entries are numbered"))
        .collect()
}

proptest! {
    #[test]
    fn prop_active_numbers_are_dense_and_unique(
        events in prop::collection::vec(event_strategy(8), 1..60)
    ) {
        let entries = run_events(&events, Some(5));

        let numbers = active_numbers(&entries);
        let unique: HashSet<i64> = numbers.iter().copied().collect();
        prop_assert_eq!(unique.len(), numbers.len());
        let expected: HashSet<i64> = (1..=numbers.len() as i64).collect();
        prop_assert_eq!(unique, expected);

        for entry in entries.iter().filter(|e| !e.is_active()) {
            prop_assert_eq!(entry.edition_number, None);
            prop_assert_eq!(entry.edition_total, None);
        }
        for entry in entries.iter().filter(|e| e.is_active()) {
            prop_assert_eq!(entry.edition_total, Some(5));
        }
    }

    #[test]
    fn prop_reassignment_is_idempotent(
        events in prop::collection::vec(event_strategy(8), 1..60)
    ) {
        let entries = run_events(&events, Some(5));

        let outcome = plan_assignment(&pid(), &entries, Some(5), TimeMs::new(1_000_000))
            .expect("a committed state never overflows");
        prop_assert!(outcome.is_noop());
    }

    #[test]
    fn prop_capacity_never_exceeded(
        events in prop::collection::vec(event_strategy(8), 1..60)
    ) {
        let entries = run_events(&events, Some(3));
        prop_assert!(active_numbers(&entries).len() <= 3);
    }

    #[test]
    fn prop_grandfathering_keeps_earliest_activations(
        order in Just((0..8usize).collect::<Vec<_>>()).prop_shuffle()
    ) {
        // Fresh activations into a size-3 edition, in any arrival order:
        // the three earliest arrivals hold 1..3 and every later arrival is
        // rejected without disturbing them.
        let events: Vec<Event> = order.iter().copied().map(Event::Activate).collect();
        let entries = run_events(&events, Some(3));

        let mut active: Vec<&LedgerEntry> =
            entries.iter().filter(|e| e.is_active()).collect();
        active.sort_by_key(|e| e.edition_number);

        prop_assert_eq!(active.len(), 3);
        for (slot, item_idx) in order.iter().take(3).enumerate() {
            prop_assert_eq!(active[slot].line_item_id.as_str(), format!("li-{}", item_idx));
            prop_assert_eq!(active[slot].edition_number, Some(slot as i64 + 1));
        }
    }

    #[test]
    fn prop_open_edition_never_numbers(
        events in prop::collection::vec(event_strategy(8), 1..60)
    ) {
        let entries = run_events(&events, None);
        for entry in &entries {
            prop_assert_eq!(entry.edition_number, None);
            prop_assert_eq!(entry.edition_total, None);
        }
    }

    #[test]
    fn prop_final_state_depends_only_on_final_statuses(
        events in prop::collection::vec(event_strategy(6), 1..40)
    ) {
        // Replaying just each item's final status yields the same active
        // set: the planner recomputes from the full set, so intermediate
        // churn cannot leak into the result.
        let entries = run_events(&events, None);

        let mut last: HashMap<usize, &Event> = HashMap::new();
        for event in &events {
            let idx = match event {
                Event::Activate(i) | Event::Deactivate(i) => *i,
            };
            last.insert(idx, event);
        }
        let mut compressed: Vec<Event> = Vec::new();
        for event in &events {
            let idx = match event {
                Event::Activate(i) | Event::Deactivate(i) => *i,
            };
            if std::ptr::eq(*last.get(&idx).unwrap(), event) {
                compressed.push(event.clone());
            }
        }
        let replayed = run_events(&compressed, None);

        let actives = |set: &[LedgerEntry]| -> HashSet<String> {
            set.iter()
                .filter(|e| e.is_active())
                .map(|e| e.line_item_id.as_str().to_string())
                .collect()
        };
        prop_assert_eq!(actives(&entries), actives(&replayed));
    }
}
