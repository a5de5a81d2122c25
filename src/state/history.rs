//! Recent-search history and named filter presets
//!
//! Both are JSON lists kept under a single key in a [`KeyValueStore`]. A
//! payload that fails to parse is treated as empty and overwritten on the
//! next write.

use crate::error::Result;
use crate::models::{FilterPreset, FilterState, SearchHistoryEntry, SortSpec};
use crate::state::KeyValueStore;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

const HISTORY_KEY: &str = "search_history";
const PRESETS_KEY: &str = "filter_presets";

fn read_list<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Vec<T> {
    match store.get(key) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key = %key, error = %e, "Discarding unreadable stored list");
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Failed to read stored list");
            Vec::new()
        }
    }
}

fn write_list<T: Serialize>(store: &dyn KeyValueStore, key: &str, items: &[T]) -> Result<()> {
    let raw = serde_json::to_string(items)?;
    store.set(key, &raw)
}

/// Most-recent-first list of past searches, capped at `limit` entries
#[derive(Clone)]
pub struct SearchHistory {
    store: Arc<dyn KeyValueStore>,
    limit: usize,
}

impl SearchHistory {
    pub fn new(store: Arc<dyn KeyValueStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Record a search; an earlier entry with the same query moves to the front
    pub fn record(&self, query: &str, filters: &FilterState, result_count: u64) -> Result<()> {
        let query = query.trim();
        if query.is_empty() || self.limit == 0 {
            return Ok(());
        }

        let mut entries: Vec<SearchHistoryEntry> = read_list(self.store.as_ref(), HISTORY_KEY);
        entries.retain(|entry| !entry.query.eq_ignore_ascii_case(query));
        entries.insert(
            0,
            SearchHistoryEntry {
                query: query.to_string(),
                filters: filters.clone(),
                result_count,
                timestamp: Utc::now(),
            },
        );
        entries.truncate(self.limit);

        write_list(self.store.as_ref(), HISTORY_KEY, &entries)?;
        tracing::debug!(query = %query, result_count, "Search recorded in history");
        Ok(())
    }

    pub fn entries(&self) -> Vec<SearchHistoryEntry> {
        read_list(self.store.as_ref(), HISTORY_KEY)
    }

    pub fn remove(&self, query: &str) -> Result<()> {
        let mut entries: Vec<SearchHistoryEntry> = read_list(self.store.as_ref(), HISTORY_KEY);
        entries.retain(|entry| !entry.query.eq_ignore_ascii_case(query.trim()));
        write_list(self.store.as_ref(), HISTORY_KEY, &entries)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(HISTORY_KEY)
    }
}

/// Named filter combinations saved on this device
#[derive(Clone)]
pub struct FilterPresets {
    store: Arc<dyn KeyValueStore>,
    limit: usize,
}

impl FilterPresets {
    pub fn new(store: Arc<dyn KeyValueStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Save a preset; saving under an existing name replaces it
    pub fn save(&self, name: &str, filters: &FilterState, sort: SortSpec) -> Result<FilterPreset> {
        let preset = FilterPreset::new(name.trim(), filters.clone(), sort);

        let mut presets: Vec<FilterPreset> = read_list(self.store.as_ref(), PRESETS_KEY);
        presets.retain(|existing| existing.name != preset.name);
        presets.insert(0, preset.clone());
        presets.truncate(self.limit);

        write_list(self.store.as_ref(), PRESETS_KEY, &presets)?;
        tracing::info!(preset_id = %preset.id, name = %preset.name, "Filter preset saved");
        Ok(preset)
    }

    pub fn list(&self) -> Vec<FilterPreset> {
        read_list(self.store.as_ref(), PRESETS_KEY)
    }

    pub fn find(&self, name: &str) -> Option<FilterPreset> {
        self.list().into_iter().find(|preset| preset.name == name.trim())
    }

    /// Delete a preset; returns whether it existed
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        let mut presets: Vec<FilterPreset> = read_list(self.store.as_ref(), PRESETS_KEY);
        let before = presets.len();
        presets.retain(|preset| preset.id != id);
        if presets.len() == before {
            return Ok(false);
        }
        write_list(self.store.as_ref(), PRESETS_KEY, &presets)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortBy;
    use crate::state::InMemoryKvStore;

    fn store() -> Arc<dyn KeyValueStore> {
        Arc::new(InMemoryKvStore::new())
    }

    #[test]
    fn test_history_is_most_recent_first_and_capped() {
        let history = SearchHistory::new(store(), 3);
        for query in ["a", "b", "c", "d"] {
            history.record(query, &FilterState::default(), 1).unwrap();
        }

        let queries: Vec<String> = history.entries().into_iter().map(|e| e.query).collect();
        assert_eq!(queries, vec!["d", "c", "b"]);
    }

    #[test]
    fn test_history_deduplicates_queries() {
        let history = SearchHistory::new(store(), 5);
        history.record("Villa Goa", &FilterState::default(), 3).unwrap();
        history.record("flat", &FilterState::default(), 7).unwrap();
        history.record("villa goa", &FilterState::default(), 4).unwrap();

        let entries = history.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].query, "villa goa");
        assert_eq!(entries[0].result_count, 4);

        history.remove(" VILLA GOA ").unwrap();
        let queries: Vec<String> = history.entries().into_iter().map(|e| e.query).collect();
        assert_eq!(queries, vec!["flat"]);
    }

    #[test]
    fn test_history_ignores_blank_queries() {
        let history = SearchHistory::new(store(), 5);
        history.record("   ", &FilterState::default(), 0).unwrap();
        assert!(history.entries().is_empty());
    }

    #[test]
    fn test_corrupt_history_reads_as_empty() {
        let kv = store();
        kv.set(HISTORY_KEY, "{not json").unwrap();
        let history = SearchHistory::new(kv, 5);

        assert!(history.entries().is_empty());
        history.record("plot", &FilterState::default(), 2).unwrap();
        assert_eq!(history.entries().len(), 1);
    }

    #[test]
    fn test_presets_replace_by_name_and_delete() {
        let presets = FilterPresets::new(store(), 10);
        let filters = FilterState {
            bedrooms: Some(2),
            ..FilterState::baseline()
        };

        let first = presets.save("family", &filters, SortSpec::default()).unwrap();
        let second = presets
            .save("family", &filters, SortSpec::by(SortBy::Price))
            .unwrap();

        assert_eq!(presets.list().len(), 1);
        assert_eq!(presets.find("family").unwrap().sort.sort_by, SortBy::Price);
        assert!(!presets.delete(first.id).unwrap());
        assert!(presets.delete(second.id).unwrap());
        assert!(presets.list().is_empty());
    }
}
