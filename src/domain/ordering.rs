//! Stable assignment ordering for deterministic edition numbering.

use crate::domain::LedgerEntry;

/// Stable ordering key for active ledger entries during assignment.
///
/// Ordering: existing edition_number (numbered entries first, ascending) ->
/// created_at -> line_item_id. The edition_number preference keeps long-held
/// numbers stable across resequencing; created_at/line_item_id give a total
/// order with no ties for entries that have never been numbered.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AssignmentKey {
    /// False for already-numbered entries so they sort first.
    pub unnumbered: bool,
    /// Existing edition number (primary sort among numbered entries).
    pub edition_number: i64,
    /// Creation time (secondary sort).
    pub created_at: i64,
    /// Line-item id (fallback sort, total order).
    pub line_item_id: String,
}

impl AssignmentKey {
    /// Create an ordering key from a ledger entry.
    pub fn from_entry(entry: &LedgerEntry) -> Self {
        AssignmentKey {
            unnumbered: entry.edition_number.is_none(),
            edition_number: entry.edition_number.unwrap_or(0),
            created_at: entry.created_at.as_i64(),
            line_item_id: entry.line_item_id.as_str().to_string(),
        }
    }
}

/// Sort entries into deterministic assignment order.
pub fn sort_for_assignment(entries: &mut [LedgerEntry]) {
    entries.sort_by(|a, b| AssignmentKey::from_entry(a).cmp(&AssignmentKey::from_entry(b)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LineItemId, OrderId, ProductId, Resolution, TimeMs};

    fn entry(id: &str, created_at: i64, number: Option<i64>) -> LedgerEntry {
        let mut e = LedgerEntry::new(
            LineItemId::new(id),
            ProductId::new("p-1"),
            OrderId::new("o-1"),
            Resolution::active(),
            TimeMs::new(created_at),
        );
        e.edition_number = number;
        e
    }

    #[test]
    fn test_numbered_entries_sort_before_unnumbered() {
        let mut entries = vec![entry("li-a", 100, None), entry("li-b", 900, Some(1))];
        sort_for_assignment(&mut entries);
        assert_eq!(entries[0].line_item_id.as_str(), "li-b");
        assert_eq!(entries[1].line_item_id.as_str(), "li-a");
    }

    #[test]
    fn test_numbered_entries_sort_by_number() {
        let mut entries = vec![entry("li-a", 100, Some(3)), entry("li-b", 900, Some(1))];
        sort_for_assignment(&mut entries);
        assert_eq!(entries[0].edition_number, Some(1));
        assert_eq!(entries[1].edition_number, Some(3));
    }

    #[test]
    fn test_unnumbered_entries_sort_by_created_at_then_id() {
        let mut entries = vec![
            entry("li-c", 200, None),
            entry("li-b", 100, None),
            entry("li-a", 200, None),
        ];
        sort_for_assignment(&mut entries);
        assert_eq!(entries[0].line_item_id.as_str(), "li-b");
        assert_eq!(entries[1].line_item_id.as_str(), "li-a");
        assert_eq!(entries[2].line_item_id.as_str(), "li-c");
    }

    #[test]
    fn test_key_determinism() {
        let e = entry("li-a", 100, Some(2));
        assert_eq!(AssignmentKey::from_entry(&e), AssignmentKey::from_entry(&e));
    }
}
