//! Result cache and paginator
//!
//! [`SearchService`] owns the accumulated result list for one search screen.
//! Pages are fetched through [`PropertyApi`], memoised in a [`ResultCache`]
//! and appended on `load_more`. Every state change is applied under a short
//! write lock that is never held across an await; responses are checked
//! against a generation counter so a superseded request never overwrites
//! newer state.

use crate::api::PropertyApi;
use crate::config::SearchConfig;
use crate::error::Result;
use crate::metrics::{observe_fetch, STALE_RESPONSES_TOTAL};
use crate::models::{
    FilterState, Property, PropertyId, SavedSearch, SearchCriteria, SearchRequest, SearchResultPage,
    SortSpec, Suggestion,
};
use crate::search::cache_key::{normalize_query, CacheKey, QueryKind};
use crate::search::fallback;
use crate::search::query::normalize_whitespace;
use crate::state::{ResultCache, SearchHistory};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Read-only view of the paginator state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSnapshot {
    pub query: String,
    pub filters: FilterState,
    pub kind: Option<QueryKind>,
    pub items: Vec<Property>,
    pub total: u64,
    pub has_more: bool,
    /// Last page appended; 0 before the first successful fetch
    pub current_page: u32,
    pub loading: bool,
    pub loading_more: bool,
    pub error: Option<String>,
}

/// The request the accumulated list belongs to
#[derive(Debug, Clone)]
struct SearchContext {
    query: String,
    filters: FilterState,
    kind: QueryKind,
}

#[derive(Debug, Default)]
struct SearchState {
    context: Option<SearchContext>,
    items: Vec<Property>,
    seen: HashSet<PropertyId>,
    total: u64,
    has_more: bool,
    current_page: u32,
    loading: bool,
    loading_more: bool,
    error: Option<String>,
    generation: u64,
}

impl SearchState {
    fn replace_with(&mut self, page: &SearchResultPage) {
        self.items = page.items.clone();
        self.seen = page.items.iter().map(|p| p.id).collect();
        self.total = page.total;
        self.has_more = page.has_more;
        self.current_page = page.page;
        self.error = None;
    }

    fn append(&mut self, page: &SearchResultPage) {
        if page.items.is_empty() {
            self.has_more = false;
            return;
        }
        for item in &page.items {
            if self.seen.insert(item.id) {
                self.items.push(item.clone());
            }
        }
        self.total = page.total;
        self.has_more = page.has_more;
        self.current_page = page.page;
        self.error = None;
    }

    fn fail(&mut self, error: String) {
        self.items.clear();
        self.seen.clear();
        self.total = 0;
        self.has_more = false;
        self.error = Some(error);
    }
}

/// Searches, pages and caches listing results for one screen
pub struct SearchService {
    api: Arc<dyn PropertyApi>,
    cache: ResultCache,
    config: SearchConfig,
    history: Option<SearchHistory>,
    state: RwLock<SearchState>,
}

impl SearchService {
    /// Create a service with its own session-scoped cache
    pub fn new(api: Arc<dyn PropertyApi>, config: SearchConfig) -> Self {
        let cache = ResultCache::new(config.cache_max_entries, config.cache_ttl());
        Self::with_cache(api, cache, config)
    }

    /// Create a service over an existing cache
    pub fn with_cache(api: Arc<dyn PropertyApi>, cache: ResultCache, config: SearchConfig) -> Self {
        Self {
            api,
            cache,
            config,
            history: None,
            state: RwLock::new(SearchState::default()),
        }
    }

    /// Record successful searches in local history
    pub fn with_history(mut self, history: SearchHistory) -> Self {
        self.history = Some(history);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.config.page_size.max(1)
    }

    /// Run a search for page 1, replacing the accumulated list.
    ///
    /// A non-empty query goes to the free-text endpoint, an empty one to the
    /// filter-only listing. Failures never propagate: the list is cleared
    /// and the error is exposed through [`snapshot`](Self::snapshot).
    #[instrument(skip(self, filters))]
    pub async fn search(&self, query: &str, filters: &FilterState) -> SearchResultPage {
        let query = normalize_whitespace(query);
        let kind = QueryKind::for_query(&normalize_query(&query));
        let context = SearchContext {
            query: query.clone(),
            filters: filters.clone(),
            kind,
        };
        let key = self.key_for(&context, 1);

        let generation = {
            let mut state = self.state.write();
            state.generation += 1;
            state.context = Some(context.clone());
            state.loading = true;
            state.loading_more = false;
            state.generation
        };

        match self.fetch_page(&context, &key, 1).await {
            Ok(page) => {
                let applied = self.apply_if_current(generation, |state| {
                    state.replace_with(&page);
                    state.loading = false;
                });
                if applied {
                    self.record_history(&context, page.total);
                }
                page
            }
            Err(e) => {
                warn!(error = %e, "Search failed");
                self.apply_if_current(generation, |state| {
                    state.fail(e.to_string());
                    state.loading = false;
                });
                SearchResultPage::empty(1)
            }
        }
    }

    /// Fetch and append the next page of the active search.
    ///
    /// Returns `None` without doing anything when there is no active search,
    /// nothing more to load, or a fetch is already in flight.
    pub async fn load_more(&self) -> Option<SearchResultPage> {
        let (context, next_page, generation) = {
            let mut state = self.state.write();
            let context = state.context.clone()?;
            if !state.has_more || state.loading || state.loading_more {
                debug!(
                    has_more = state.has_more,
                    loading = state.loading,
                    loading_more = state.loading_more,
                    "load_more ignored"
                );
                return None;
            }
            state.loading_more = true;
            (context, state.current_page + 1, state.generation)
        };

        let key = self.key_for(&context, next_page);
        match self.fetch_page(&context, &key, next_page).await {
            Ok(page) => {
                self.apply_if_current(generation, |state| {
                    state.append(&page);
                    state.loading_more = false;
                });
                Some(page)
            }
            Err(e) => {
                warn!(error = %e, page = next_page, "Loading more results failed");
                self.apply_if_current(generation, |state| {
                    state.fail(e.to_string());
                    state.loading_more = false;
                });
                Some(SearchResultPage::empty(next_page))
            }
        }
    }

    /// Re-run the active search against the server.
    ///
    /// Every page the last known total spans is evicted for the active
    /// context first, so page 1 and any later `load_more` go to the network
    /// again. Returns `None` when there is no active search.
    pub async fn refresh(&self) -> Option<SearchResultPage> {
        let (context, loaded_pages) = {
            let state = self.state.read();
            let spanned = state
                .total
                .div_ceil(u64::from(self.page_size()))
                .min(self.config.cache_max_entries);
            let spanned = u32::try_from(spanned).unwrap_or(u32::MAX);
            (state.context.clone()?, spanned.max(state.current_page).max(1))
        };
        for page in 1..=loaded_pages {
            self.cache.evict(&self.key_for(&context, page)).await;
        }
        info!(query = %context.query, pages = loaded_pages, "Refreshing search");
        Some(self.search(&context.query, &context.filters).await)
    }

    /// Forget the active search. Cached pages are kept for reuse.
    pub fn clear_search(&self) {
        let mut state = self.state.write();
        let generation = state.generation + 1;
        *state = SearchState {
            generation,
            ..SearchState::default()
        };
        debug!("Search cleared");
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        let state = self.state.read();
        let (query, filters, kind) = match &state.context {
            Some(context) => (context.query.clone(), context.filters.clone(), Some(context.kind)),
            None => (String::new(), FilterState::default(), None),
        };
        SearchSnapshot {
            query,
            filters,
            kind,
            items: state.items.clone(),
            total: state.total,
            has_more: state.has_more,
            current_page: state.current_page,
            loading: state.loading,
            loading_more: state.loading_more,
            error: state.error.clone(),
        }
    }

    /// Accumulated items after client-side refinement and sorting
    pub fn results(&self, sort: &SortSpec) -> Vec<Property> {
        let state = self.state.read();
        let filters = state
            .context
            .as_ref()
            .map(|context| context.filters.clone())
            .unwrap_or_default();
        fallback::refine(&state.items, &filters, sort)
    }

    /// Autocomplete for a partial query; short input yields nothing
    pub async fn suggestions(&self, partial: &str) -> Result<Vec<Suggestion>> {
        let partial = partial.trim();
        if partial.chars().count() < self.config.suggestion_min_chars {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        let result = self.api.get_property_suggestions(partial).await;
        observe_fetch("suggestions", result.is_ok(), start.elapsed());
        result
    }

    /// Save the active search on the server
    pub async fn save_search(&self, name: &str, sort: SortSpec) -> Result<SavedSearch> {
        let criteria = {
            let state = self.state.read();
            match &state.context {
                Some(context) => SearchCriteria {
                    query: context.query.clone(),
                    filters: context.filters.clone(),
                    sort,
                },
                None => SearchCriteria {
                    sort,
                    ..SearchCriteria::default()
                },
            }
        };
        let saved = self.api.save_search(&criteria, name).await?;
        info!(id = %saved.id, name = %saved.name, "Search saved");
        Ok(saved)
    }

    pub async fn saved_searches(&self) -> Result<Vec<SavedSearch>> {
        self.api.get_saved_searches().await
    }

    pub async fn delete_saved_search(&self, id: &str) -> Result<()> {
        self.api.delete_saved_search(id).await
    }

    fn key_for(&self, context: &SearchContext, page: u32) -> CacheKey {
        CacheKey::new(context.kind, &context.query, &context.filters, page, self.page_size())
    }

    /// Cached page or a remote fetch; fetched pages are cached even when
    /// they turn out to be stale.
    async fn fetch_page(&self, context: &SearchContext, key: &CacheKey, page: u32) -> Result<SearchResultPage> {
        if let Some(cached) = self.cache.lookup(key).await {
            return Ok(cached);
        }

        let limit = self.page_size();
        let start = Instant::now();
        let result = match context.kind {
            QueryKind::Search => {
                let request = SearchRequest {
                    query: context.query.clone(),
                    filters: context.filters.clone(),
                    page,
                    limit,
                };
                self.api.search_properties(&request).await.map(|response| {
                    let served = served_through(page, limit, response.properties.len());
                    SearchResultPage {
                        has_more: !response.properties.is_empty() && served < response.total,
                        items: response.properties,
                        total: response.total,
                        page,
                    }
                })
            }
            QueryKind::Filter => self
                .api
                .get_filtered_properties(&context.filters, page, limit)
                .await
                .map(|response| SearchResultPage {
                    has_more: response.has_more && !response.properties.is_empty(),
                    items: response.properties,
                    total: response.total,
                    page,
                }),
        };
        observe_fetch(&context.kind.to_string(), result.is_ok(), start.elapsed());

        let page = result?;
        debug!(key = %key, items = page.items.len(), total = page.total, "Fetched result page");
        self.cache.store(key.clone(), page.clone()).await;
        Ok(page)
    }

    /// Apply `update` only if no newer search started since `generation`
    fn apply_if_current(&self, generation: u64, update: impl FnOnce(&mut SearchState)) -> bool {
        let mut state = self.state.write();
        if state.generation != generation {
            STALE_RESPONSES_TOTAL.inc();
            debug!(generation, current = state.generation, "Discarding superseded response");
            return false;
        }
        update(&mut state);
        true
    }

    fn record_history(&self, context: &SearchContext, result_count: u64) {
        if let Some(history) = &self.history {
            if let Err(e) = history.record(&context.query, &context.filters, result_count) {
                warn!(error = %e, "Failed to record search history");
            }
        }
    }
}

/// Number of items the server has produced up to and including `page`
fn served_through(page: u32, limit: u32, page_len: usize) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(limit) + page_len as u64
}
