use crate::api::PropertyApi;
use crate::error::{AppError, Result};
use crate::models::{
    FavoriteToggle, FilterState, FilteredResponse, Property, PropertyId, SavedSearch, SearchCriteria,
    SearchRequest, SearchResponse, Suggestion,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Calls received per endpoint
#[derive(Debug, Default)]
pub struct CallCounts {
    pub search: AtomicUsize,
    pub filter: AtomicUsize,
    pub suggestions: AtomicUsize,
    pub toggle: AtomicUsize,
    pub favorites: AtomicUsize,
}

/// Listing API backed by an in-process dataset.
///
/// Supports injected latency and failures so races and rollbacks can be
/// reproduced deterministically.
#[derive(Clone, Default)]
pub struct InMemoryPropertyApi {
    properties: Arc<RwLock<Vec<Property>>>,
    favorites: Arc<RwLock<BTreeSet<PropertyId>>>,
    saved: Arc<RwLock<Vec<SavedSearch>>>,
    calls: Arc<CallCounts>,
    failing: Arc<AtomicBool>,
    query_delays: Arc<DashMap<String, Duration>>,
    toggle_delays: Arc<DashMap<PropertyId, Duration>>,
    forced_toggles: Arc<DashMap<PropertyId, bool>>,
    favorites_delay: Arc<RwLock<Option<Duration>>>,
    favorites_failing: Arc<AtomicBool>,
}

impl InMemoryPropertyApi {
    pub fn new(properties: Vec<Property>) -> Self {
        Self {
            properties: Arc::new(RwLock::new(properties)),
            ..Default::default()
        }
    }

    pub fn with_favorites(self, ids: impl IntoIterator<Item = PropertyId>) -> Self {
        self.favorites.write().extend(ids);
        self
    }

    pub fn calls(&self) -> &CallCounts {
        &self.calls
    }

    /// Make every call fail with a network error until reset
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay responses for a query (case-insensitive); `""` targets filter-only calls
    pub fn delay_query(&self, query: &str, delay: Duration) {
        self.query_delays.insert(query.trim().to_lowercase(), delay);
    }

    pub fn delay_toggle(&self, id: PropertyId, delay: Duration) {
        self.toggle_delays.insert(id, delay);
    }

    /// Make toggles of `id` end in `is_favorite` instead of flipping
    pub fn force_toggle_result(&self, id: PropertyId, is_favorite: bool) {
        self.forced_toggles.insert(id, is_favorite);
    }

    /// Hold favorites responses for `delay` after the server-side snapshot is taken
    pub fn delay_favorites_fetch(&self, delay: Duration) {
        *self.favorites_delay.write() = Some(delay);
    }

    /// Fail only the favorites listing endpoint
    pub fn set_favorites_fetch_failing(&self, failing: bool) {
        self.favorites_failing.store(failing, Ordering::SeqCst);
    }

    /// Server-side favorite membership
    pub fn server_favorites(&self) -> BTreeSet<PropertyId> {
        self.favorites.read().clone()
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Network("listing API unavailable".to_string()));
        }
        Ok(())
    }

    async fn simulate_latency(&self, query: &str) {
        let delay = self
            .query_delays
            .get(&query.trim().to_lowercase())
            .map(|entry| *entry.value());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn matching(&self, query: &str, filters: &FilterState) -> Vec<Property> {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        self.properties
            .read()
            .iter()
            .filter(|property| matches_server_filters(property, filters))
            .filter(|property| {
                let text = format!(
                    "{} {} {}",
                    property.title.to_lowercase(),
                    property.location.to_lowercase(),
                    property.description.to_lowercase()
                );
                terms.iter().all(|term| text.contains(term.as_str()))
            })
            .cloned()
            .collect()
    }
}

/// Constraints the listing backend evaluates itself.
///
/// Amenities and features are not among them; those are refined client-side.
pub fn matches_server_filters(property: &Property, filters: &FilterState) -> bool {
    if let Some(location) = filters.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        if !property.location.to_lowercase().contains(&location.to_lowercase()) {
            return false;
        }
    }
    if !filters.property_types.is_empty() && !filters.property_types.contains(&property.property_type) {
        return false;
    }
    if filters.listing_type.is_some_and(|listing| listing != property.listing_type) {
        return false;
    }
    if filters.min_price.is_some_and(|min| property.price < min)
        || filters.max_price.is_some_and(|max| property.price > max)
    {
        return false;
    }
    if filters.min_area.is_some_and(|min| property.area < f64::from(min))
        || filters.max_area.is_some_and(|max| property.area > f64::from(max))
    {
        return false;
    }
    if filters.bedrooms.is_some_and(|beds| property.bedrooms < beds)
        || filters.bathrooms.is_some_and(|baths| property.bathrooms < baths)
    {
        return false;
    }
    if filters.is_featured.is_some_and(|featured| featured != property.is_featured) {
        return false;
    }
    if filters.is_active.is_some_and(|active| active != property.is_active) {
        return false;
    }
    true
}

fn page_slice(items: Vec<Property>, page: u32, limit: u32) -> Vec<Property> {
    let start = (page.saturating_sub(1) as usize).saturating_mul(limit as usize);
    items.into_iter().skip(start).take(limit as usize).collect()
}

#[async_trait]
impl PropertyApi for InMemoryPropertyApi {
    async fn search_properties(&self, request: &SearchRequest) -> Result<SearchResponse> {
        self.calls.search.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency(&request.query).await;
        self.check_available()?;

        let matches = self.matching(&request.query, &request.filters);
        let total = matches.len() as u64;
        Ok(SearchResponse {
            properties: page_slice(matches, request.page, request.limit),
            total,
        })
    }

    async fn get_filtered_properties(
        &self,
        filters: &FilterState,
        page: u32,
        limit: u32,
    ) -> Result<FilteredResponse> {
        self.calls.filter.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency("").await;
        self.check_available()?;

        let matches = self.matching("", filters);
        let total = matches.len() as u64;
        let properties = page_slice(matches, page, limit);
        let served = u64::from(page.saturating_sub(1)) * u64::from(limit) + properties.len() as u64;
        Ok(FilteredResponse {
            has_more: served < total,
            properties,
            total,
        })
    }

    async fn get_property_suggestions(&self, query: &str) -> Result<Vec<Suggestion>> {
        self.calls.suggestions.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let needle = query.trim().to_lowercase();
        let mut counts: HashMap<String, u64> = HashMap::new();
        for property in self.properties.read().iter() {
            if property.location.to_lowercase().contains(&needle) {
                *counts.entry(property.location.clone()).or_default() += 1;
            }
        }
        let mut suggestions: Vec<Suggestion> = counts
            .into_iter()
            .map(|(text, count)| Suggestion {
                text,
                kind: "location".to_string(),
                count,
            })
            .collect();
        suggestions.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.text.cmp(&b.text)));
        suggestions.truncate(5);
        Ok(suggestions)
    }

    async fn save_search(&self, criteria: &SearchCriteria, name: &str) -> Result<SavedSearch> {
        self.check_available()?;
        let saved = SavedSearch {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            criteria: criteria.clone(),
            created_at: Utc::now(),
        };
        self.saved.write().push(saved.clone());
        Ok(saved)
    }

    async fn get_saved_searches(&self) -> Result<Vec<SavedSearch>> {
        self.check_available()?;
        Ok(self.saved.read().clone())
    }

    async fn delete_saved_search(&self, id: &str) -> Result<()> {
        self.check_available()?;
        let mut saved = self.saved.write();
        let before = saved.len();
        saved.retain(|search| search.id != id);
        if saved.len() == before {
            return Err(AppError::NotFound(format!("Saved search {} not found", id)));
        }
        Ok(())
    }

    async fn toggle_favorite(&self, property_id: PropertyId) -> Result<FavoriteToggle> {
        self.calls.toggle.fetch_add(1, Ordering::SeqCst);
        let delay = self.toggle_delays.get(&property_id).map(|entry| *entry.value());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_available()?;

        let forced = self.forced_toggles.get(&property_id).map(|entry| *entry.value());
        let mut favorites = self.favorites.write();
        let is_favorite = forced.unwrap_or(!favorites.contains(&property_id));
        if is_favorite {
            favorites.insert(property_id);
        } else {
            favorites.remove(&property_id);
        }
        Ok(FavoriteToggle {
            property_id,
            is_favorite,
        })
    }

    async fn get_favorite_properties(&self) -> Result<Vec<Property>> {
        self.calls.favorites.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        if self.favorites_failing.load(Ordering::SeqCst) {
            return Err(AppError::Network("favorites endpoint unavailable".to_string()));
        }

        let favorites = self.favorites.read().clone();
        let snapshot: Vec<Property> = self
            .properties
            .read()
            .iter()
            .filter(|property| favorites.contains(&property.id))
            .cloned()
            .collect();

        let delay = *self.favorites_delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(snapshot)
    }
}
