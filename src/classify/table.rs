//! Deduplicating identity table.

use std::collections::HashMap;

use serde::Serialize;

/// One entry per distinct identity observed in a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityRecord {
    /// Exact destination string (URL or host); the dedup key.
    pub identity: String,
    /// Outcome of the most recent event for this identity.
    pub status: bool,
}

/// Mapping from identity to [`IdentityRecord`] that remembers first-seen order.
///
/// A later upsert of an existing identity replaces its status but keeps its
/// position.
#[derive(Debug, Default, Clone)]
pub struct ClassificationTable {
    index: HashMap<String, usize>,
    records: Vec<IdentityRecord>,
}

impl ClassificationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `status` for `identity`, overwriting any earlier status.
    ///
    /// Returns `true` when the identity was not present before.
    pub fn upsert(&mut self, identity: &str, status: bool) -> bool {
        if let Some(&pos) = self.index.get(identity) {
            self.records[pos].status = status;
            return false;
        }
        self.index.insert(identity.to_string(), self.records.len());
        self.records.push(IdentityRecord {
            identity: identity.to_string(),
            status,
        });
        true
    }

    /// Current status of `identity`, if it was ever recorded.
    pub fn status(&self, identity: &str) -> Option<bool> {
        self.index.get(identity).map(|&pos| self.records[pos].status)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in first-seen order.
    pub fn iter(&self) -> std::slice::Iter<'_, IdentityRecord> {
        self.records.iter()
    }

    /// Consumes the table, yielding its records in first-seen order.
    pub fn into_records(self) -> Vec<IdentityRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_new_and_existing() {
        let mut table = ClassificationTable::new();
        assert!(table.is_empty());
        assert!(table.upsert("https://a.com/x", true));
        assert!(!table.upsert("https://a.com/x", false));
        assert_eq!(table.len(), 1);
        assert_eq!(table.status("https://a.com/x"), Some(false));
        assert_eq!(table.status("https://b.com/"), None);
    }

    #[test]
    fn test_overwrite_keeps_first_seen_position() {
        let mut table = ClassificationTable::new();
        table.upsert("c", true);
        table.upsert("a", true);
        table.upsert("b", false);
        table.upsert("c", false);

        let order: Vec<_> = table.iter().map(|r| r.identity.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
        assert_eq!(
            table.into_records()[0],
            IdentityRecord {
                identity: "c".to_string(),
                status: false
            }
        );
    }

    #[test]
    fn test_keys_are_exact_strings() {
        let mut table = ClassificationTable::new();
        table.upsert("https://a.com/", true);
        table.upsert("https://a.com", true);
        table.upsert("https://A.com/", true);
        assert_eq!(table.len(), 3);
    }
}
