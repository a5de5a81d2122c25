//! Two-way synchronisation of filter state with the URL and durable storage

use crate::config::SyncConfig;
use crate::filters::debounce::Debouncer;
use crate::filters::url::{decode_state, encode_state};
use crate::metrics::URL_WRITES_TOTAL;
use crate::models::{FilterState, SortSpec};
use crate::state::KeyValueStore;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// The addressable location of the current screen.
///
/// `replace_query` rewrites the query string in place (history replace, not
/// push) and must not trigger navigation or a data reload.
pub trait LocationSink: Send + Sync {
    /// Current query string without the leading `?`
    fn current_query(&self) -> String;

    fn replace_query(&self, query: &str);
}

/// In-memory location, used by tests and by non-browser hosts
#[derive(Default)]
pub struct MemoryLocation {
    query: Mutex<String>,
    writes: AtomicUsize,
}

impl MemoryLocation {
    pub fn new(initial_query: impl Into<String>) -> Self {
        Self {
            query: Mutex::new(initial_query.into()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of `replace_query` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl LocationSink for MemoryLocation {
    fn current_query(&self) -> String {
        self.query.lock().clone()
    }

    fn replace_query(&self, query: &str) {
        *self.query.lock() = query.trim_start_matches('?').to_string();
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Where restored state came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Url,
    Storage,
    Initial,
}

/// Filter and sort state restored on mount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedState {
    pub filters: FilterState,
    pub sort: SortSpec,
    pub source: LoadSource,
}

/// Mirrors filter state to the URL (debounced) and to durable storage.
///
/// Storage writes happen on every save; URL writes are coalesced by a
/// trailing-edge debouncer and flushed when the synchronizer is dropped.
pub struct FilterSynchronizer {
    location: Arc<dyn LocationSink>,
    store: Option<Arc<dyn KeyValueStore>>,
    storage_key: String,
    url_writer: Debouncer<String>,
}

impl FilterSynchronizer {
    /// Create a synchronizer for one screen; `screen` namespaces the storage key
    pub fn new(
        location: Arc<dyn LocationSink>,
        store: Option<Arc<dyn KeyValueStore>>,
        screen: &str,
        config: &SyncConfig,
    ) -> Self {
        let sink_location = Arc::clone(&location);
        let url_writer = Debouncer::new(config.debounce(), move |query: String| {
            if sink_location.current_query() == query {
                return;
            }
            sink_location.replace_query(&query);
            URL_WRITES_TOTAL.inc();
            tracing::debug!(query = %query, "Filter state written to URL");
        });

        Self {
            location,
            store: if config.persist_to_storage { store } else { None },
            storage_key: format!("{}:{}", config.storage_key_prefix, screen),
            url_writer,
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Restore state: the URL wins when it carries any known parameter,
    /// then durable storage, then `initial`. Sources are never mixed.
    pub fn load(&self, initial_filters: &FilterState, initial_sort: &SortSpec) -> LoadedState {
        let from_url = decode_state(&self.location.current_query());
        if from_url.recognised {
            tracing::debug!("Filter state restored from URL");
            return LoadedState {
                filters: from_url.filters,
                sort: from_url.sort,
                source: LoadSource::Url,
            };
        }

        if let Some(store) = &self.store {
            match store.get(&self.storage_key) {
                Ok(Some(raw)) => {
                    let stored = decode_state(&raw);
                    if stored.recognised {
                        tracing::debug!(key = %self.storage_key, "Filter state restored from storage");
                        return LoadedState {
                            filters: stored.filters,
                            sort: stored.sort,
                            source: LoadSource::Storage,
                        };
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(key = %self.storage_key, error = %e, "Failed to read stored filters")
                }
            }
        }

        LoadedState {
            filters: initial_filters.clone(),
            sort: *initial_sort,
            source: LoadSource::Initial,
        }
    }

    /// Persist state; the URL write is debounced
    pub fn save(&self, filters: &FilterState, sort: &SortSpec) {
        let encoded = encode_state(filters, sort);

        if let Some(store) = &self.store {
            let result = if encoded.is_empty() {
                store.remove(&self.storage_key)
            } else {
                store.set(&self.storage_key, &encoded)
            };
            if let Err(e) = result {
                tracing::warn!(key = %self.storage_key, error = %e, "Failed to persist filters");
            }
        }

        self.url_writer.schedule(encoded);
    }

    /// Write any pending URL update immediately
    pub fn flush(&self) -> bool {
        self.url_writer.flush()
    }

    /// Discard a pending URL update
    pub fn cancel_pending(&self) {
        self.url_writer.cancel();
    }

    pub fn has_pending_write(&self) -> bool {
        self.url_writer.is_pending()
    }
}
