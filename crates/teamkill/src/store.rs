//! The counter store: the single source of truth for kill counts.
//!
//! [`CounterStore`] exposes exactly three operations. Implementations must
//! serialize every mutation (read, modify, durable commit) behind one global
//! lock so concurrent commands never lose an update, and must not report
//! success before the commit is durable.
//!
//! [`CounterTable`] holds the mapping itself and the rules for changing it.
//! Stores that persist the whole mapping at once (memory, JSON file) load a
//! table, apply the change and write it back.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::StoreError;

/// A single counter change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    Increment,
    Decrement,
}

/// One user's current count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    pub user_id: String,
    pub display_name: String,
    pub count: u64,
}

/// Durable mapping from user id to display name and count.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Apply `delta` to the user's count and return the new value.
    ///
    /// The display name is replaced with `display_name` whenever the delta is
    /// applied.
    ///
    /// # Errors
    ///
    /// [`StoreError::NothingToSubtract`] when decrementing an untracked user
    /// or a user at zero; nothing is written in that case. Any other error is
    /// a persistence failure and the change may not have been committed.
    async fn apply_delta(
        &self,
        user_id: &str,
        display_name: &str,
        delta: Delta,
    ) -> Result<u64, StoreError>;

    /// All records with a non-zero count, highest first, ties by user id.
    async fn snapshot(&self) -> Result<Vec<CounterRecord>, StoreError>;

    /// Replace the whole state with an empty mapping.
    async fn clear_all(&self) -> Result<(), StoreError>;
}

/// Stored value for a user.
///
/// Field names match the bot's historical `tk_data.json` layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCounter {
    #[serde(rename = "username")]
    pub display_name: String,
    #[serde(rename = "tks")]
    pub count: u64,
}

/// The complete counter mapping, keyed by user id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterTable {
    users: BTreeMap<String, StoredCounter>,
}

impl CounterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a delta in place.
    ///
    /// Leaves the table untouched when returning an error.
    pub fn apply(
        &mut self,
        user_id: &str,
        display_name: &str,
        delta: Delta,
    ) -> Result<u64, StoreError> {
        match delta {
            Delta::Increment => {
                let entry = self
                    .users
                    .entry(user_id.to_owned())
                    .or_insert_with(|| StoredCounter {
                        display_name: display_name.to_owned(),
                        count: 0,
                    });
                entry.count += 1;
                entry.display_name = display_name.to_owned();
                Ok(entry.count)
            }
            Delta::Decrement => match self.users.get_mut(user_id) {
                Some(entry) if entry.count > 0 => {
                    entry.count -= 1;
                    entry.display_name = display_name.to_owned();
                    Ok(entry.count)
                }
                entry => Err(StoreError::NothingToSubtract {
                    user_id: user_id.to_owned(),
                    tracked: entry.is_some(),
                }),
            },
        }
    }

    /// Leaderboard view: zero counts dropped, count descending, then user id.
    pub fn snapshot(&self) -> Vec<CounterRecord> {
        let mut records: Vec<CounterRecord> = self
            .users
            .iter()
            .filter(|(_, stored)| stored.count > 0)
            .map(|(user_id, stored)| CounterRecord {
                user_id: user_id.clone(),
                display_name: stored.display_name.clone(),
                count: stored.count,
            })
            .collect();
        // BTreeMap iteration is already ordered by user id; a stable sort keeps it for ties.
        records.sort_by(|a, b| b.count.cmp(&a.count));
        records
    }

    pub fn get(&self, user_id: &str) -> Option<&StoredCounter> {
        self.users.get(user_id)
    }

    /// Number of tracked users, including those at zero.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// In-process store.
///
/// Keeps the table behind a single async mutex. Nothing survives a restart,
/// so this is meant for tests and for running the bot without a data file.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    table: Mutex<CounterTable>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing table.
    pub fn with_table(table: CounterTable) -> Self {
        Self {
            table: Mutex::new(table),
        }
    }

    /// Copy of the full table, zero counts included.
    pub async fn table(&self) -> CounterTable {
        self.table.lock().await.clone()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn apply_delta(
        &self,
        user_id: &str,
        display_name: &str,
        delta: Delta,
    ) -> Result<u64, StoreError> {
        self.table.lock().await.apply(user_id, display_name, delta)
    }

    async fn snapshot(&self) -> Result<Vec<CounterRecord>, StoreError> {
        Ok(self.table.lock().await.snapshot())
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        *self.table.lock().await = CounterTable::new();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_creates_record() {
        let mut table = CounterTable::new();
        assert_eq!(table.apply("1", "Alice", Delta::Increment).unwrap(), 1);
        assert_eq!(table.apply("1", "Alice", Delta::Increment).unwrap(), 2);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn increment_refreshes_display_name() {
        let mut table = CounterTable::new();
        table.apply("1", "Alice", Delta::Increment).unwrap();
        table.apply("1", "Alicia", Delta::Increment).unwrap();
        assert_eq!(table.get("1").unwrap().display_name, "Alicia");
    }

    #[test]
    fn decrement_unknown_user_is_rejected_without_creating() {
        let mut table = CounterTable::new();
        let err = table.apply("2", "Bob", Delta::Decrement).unwrap_err();
        assert!(matches!(
            err,
            StoreError::NothingToSubtract { ref user_id, tracked: false } if user_id == "2"
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn decrement_at_zero_is_rejected_and_keeps_record() {
        let mut table = CounterTable::new();
        table.apply("1", "Alice", Delta::Increment).unwrap();
        assert_eq!(table.apply("1", "Alice", Delta::Decrement).unwrap(), 0);

        let before = table.clone();
        let err = table.apply("1", "Renamed", Delta::Decrement).unwrap_err();
        assert!(matches!(
            err,
            StoreError::NothingToSubtract { tracked: true, .. }
        ));
        assert_eq!(table, before);
        assert_eq!(table.get("1").unwrap().count, 0);
    }

    #[test]
    fn snapshot_hides_zero_counts_and_sorts_descending() {
        let mut table = CounterTable::new();
        for _ in 0..2 {
            table.apply("b", "Bob", Delta::Increment).unwrap();
        }
        table.apply("a", "Alice", Delta::Increment).unwrap();
        for _ in 0..3 {
            table.apply("c", "Carol", Delta::Increment).unwrap();
        }
        table.apply("z", "Zed", Delta::Increment).unwrap();
        table.apply("d", "Dan", Delta::Increment).unwrap();
        table.apply("d", "Dan", Delta::Decrement).unwrap();

        let names: Vec<_> = table
            .snapshot()
            .into_iter()
            .map(|r| (r.display_name, r.count))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Carol".to_string(), 3),
                ("Bob".to_string(), 2),
                ("Alice".to_string(), 1),
                ("Zed".to_string(), 1),
            ]
        );
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn table_serializes_in_legacy_layout() {
        let mut table = CounterTable::new();
        table.apply("123", "Alice", Delta::Increment).unwrap();
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "123": { "username": "Alice", "tks": 1 } })
        );
    }

    #[tokio::test]
    async fn memory_store_clear_all_starts_fresh() {
        let store = MemoryCounterStore::new();
        store.apply_delta("1", "Alice", Delta::Increment).await.unwrap();
        store.apply_delta("1", "Alice", Delta::Increment).await.unwrap();

        store.clear_all().await.unwrap();
        assert!(store.snapshot().await.unwrap().is_empty());
        assert!(store.table().await.is_empty());

        assert_eq!(
            store.apply_delta("1", "Alice", Delta::Increment).await.unwrap(),
            1
        );
    }
}
