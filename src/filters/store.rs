//! Canonical filter and sort state for one listing screen

use crate::filters::sync::{FilterSynchronizer, LoadSource};
use crate::models::{FilterState, FilterUpdate, SortBy, SortSpec};
use crate::search::ParsedQuery;

/// Holds the current filters and sort order.
///
/// Mutations are synchronous and last-write-wins. Every mutation is handed to
/// the attached [`FilterSynchronizer`], if any.
pub struct FilterStore {
    filters: FilterState,
    sort: SortSpec,
    initial_filters: FilterState,
    initial_sort: SortSpec,
    defaults: FilterState,
    sync: Option<FilterSynchronizer>,
}

impl FilterStore {
    pub fn new(initial_filters: FilterState, initial_sort: SortSpec) -> Self {
        Self {
            filters: initial_filters.clone(),
            sort: initial_sort,
            initial_filters,
            initial_sort,
            defaults: FilterState::baseline(),
            sync: None,
        }
    }

    /// Attach a synchronizer and adopt whatever state it restores.
    ///
    /// Restoring does not write back; nothing changed yet.
    pub fn with_synchronizer(mut self, sync: FilterSynchronizer) -> Self {
        let loaded = sync.load(&self.initial_filters, &self.initial_sort);
        if loaded.source != LoadSource::Initial {
            tracing::info!(source = ?loaded.source, "Restored persisted filter state");
        }
        self.filters = loaded.filters;
        self.sort = loaded.sort;
        self.sync = Some(sync);
        self
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    /// Replace one field and persist
    pub fn update_filter(&mut self, update: FilterUpdate) {
        tracing::trace!(field = %update.key(), "Updating filter");
        self.filters.apply(update);
        self.persist();
    }

    /// Replace the whole filter object
    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
        self.persist();
    }

    /// Overlay filters extracted from a free-text query
    pub fn apply_extracted(&mut self, parsed: &ParsedQuery) {
        if !parsed.has_extracted_filters() {
            return;
        }
        self.filters.merge(&parsed.extracted_filters);
        self.persist();
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
        self.persist();
    }

    /// Select a sort field; picking the current one again flips the direction
    pub fn toggle_sort(&mut self, sort_by: SortBy) {
        self.sort.toggle(sort_by);
        self.persist();
    }

    /// Back to the baseline filters. Sort is kept.
    pub fn clear_filters(&mut self) {
        self.filters = self.defaults.clone();
        self.persist();
    }

    /// Back to the filters and sort this store was constructed with
    pub fn reset_filters(&mut self) {
        self.filters = self.initial_filters.clone();
        self.sort = self.initial_sort;
        self.persist();
    }

    pub fn active_filter_count(&self) -> usize {
        self.filters.active_count(&self.defaults)
    }

    pub fn has_active_filters(&self) -> bool {
        self.active_filter_count() > 0
    }

    /// Write any debounced URL update now
    pub fn flush(&self) -> bool {
        self.sync.as_ref().is_some_and(FilterSynchronizer::flush)
    }

    /// Detach the synchronizer, flushing its pending write
    pub fn teardown(&mut self) {
        if let Some(sync) = self.sync.take() {
            sync.flush();
        }
    }

    fn persist(&self) {
        if let Some(sync) = &self.sync {
            sync.save(&self.filters, &self.sort);
        }
    }
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new(FilterState::baseline(), SortSpec::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::filters::sync::{LocationSink, MemoryLocation};
    use crate::models::{ListingType, PropertyType, SortOrder};
    use crate::search::query;
    use std::sync::Arc;

    #[test]
    fn test_update_filter_leaves_other_fields() {
        let mut store = FilterStore::default();
        store.update_filter(FilterUpdate::Bedrooms(Some(2)));
        store.update_filter(FilterUpdate::Location(Some("Pune".to_string())));

        assert_eq!(store.filters().bedrooms, Some(2));
        assert_eq!(store.filters().location.as_deref(), Some("Pune"));
        assert_eq!(store.filters().is_active, Some(true));
        assert_eq!(store.active_filter_count(), 2);
    }

    #[test]
    fn test_clear_and_reset_differ() {
        let initial = FilterState {
            listing_type: Some(ListingType::Rent),
            ..FilterState::baseline()
        };
        let mut store = FilterStore::new(initial.clone(), SortSpec::by(SortBy::Price));
        store.update_filter(FilterUpdate::MaxPrice(Some(9000)));
        store.toggle_sort(SortBy::Area);

        store.clear_filters();
        assert_eq!(store.filters(), &FilterState::baseline());
        assert_eq!(store.sort().sort_by, SortBy::Area);
        assert!(!store.has_active_filters());

        store.reset_filters();
        assert_eq!(store.filters(), &initial);
        assert_eq!(store.sort(), SortSpec::by(SortBy::Price));
        assert_eq!(store.active_filter_count(), 1);
    }

    #[test]
    fn test_toggle_sort_twice_flips_order() {
        let mut store = FilterStore::default();
        store.toggle_sort(SortBy::Price);
        store.toggle_sort(SortBy::Price);
        assert_eq!(store.sort().sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_apply_extracted_merges_query_filters() {
        let mut store = FilterStore::default();
        store.update_filter(FilterUpdate::Location(Some("Goa".to_string())));

        store.apply_extracted(&query::parse("3 bhk villa for rent"));
        let filters = store.filters();
        assert_eq!(filters.bedrooms, Some(3));
        assert_eq!(filters.property_types, vec![PropertyType::Villa]);
        assert_eq!(filters.listing_type, Some(ListingType::Rent));
        assert_eq!(filters.location.as_deref(), Some("Goa"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_synchronized_store_restores_and_persists() {
        let location = Arc::new(MemoryLocation::new("beds=2"));
        let sync = FilterSynchronizer::new(location.clone(), None, "search", &SyncConfig::default());

        let mut store = FilterStore::default().with_synchronizer(sync);
        assert_eq!(store.filters().bedrooms, Some(2));
        assert_eq!(location.write_count(), 0);

        store.update_filter(FilterUpdate::Bedrooms(Some(4)));
        store.teardown();
        assert_eq!(location.current_query(), "beds=4");
    }
}
