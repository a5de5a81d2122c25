//! Listing API collaborator surface
//!
//! The search pipeline and favorites coordinator only talk to the listing
//! backend through [`PropertyApi`]. [`HttpPropertyApi`] is the production
//! implementation; [`InMemoryPropertyApi`] serves offline runs and tests.

mod http;
mod memory;

pub use http::HttpPropertyApi;
pub use memory::{matches_server_filters, CallCounts, InMemoryPropertyApi};

use crate::error::Result;
use crate::models::{
    FavoriteToggle, FilterState, FilteredResponse, Property, PropertyId, SavedSearch, SearchCriteria,
    SearchRequest, SearchResponse, Suggestion,
};
use async_trait::async_trait;

/// Remote operations consumed by the search subsystem
#[async_trait]
pub trait PropertyApi: Send + Sync {
    /// Free-text search
    async fn search_properties(&self, request: &SearchRequest) -> Result<SearchResponse>;

    /// Filter-only listing
    async fn get_filtered_properties(
        &self,
        filters: &FilterState,
        page: u32,
        limit: u32,
    ) -> Result<FilteredResponse>;

    /// Autocomplete suggestions for a partial query
    async fn get_property_suggestions(&self, query: &str) -> Result<Vec<Suggestion>>;

    /// Store a named search on the server
    async fn save_search(&self, criteria: &SearchCriteria, name: &str) -> Result<SavedSearch>;

    async fn get_saved_searches(&self) -> Result<Vec<SavedSearch>>;

    async fn delete_saved_search(&self, id: &str) -> Result<()>;

    /// Flip favorite membership and report the resulting state
    async fn toggle_favorite(&self, property_id: PropertyId) -> Result<FavoriteToggle>;

    async fn get_favorite_properties(&self) -> Result<Vec<Property>>;
}
