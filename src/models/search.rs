use crate::models::filter::{FilterState, SortSpec};
use crate::models::property::{Property, PropertyId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One page of results as held by the result cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultPage {
    pub items: Vec<Property>,

    /// Total matches reported by the server for the whole query
    pub total: u64,

    pub has_more: bool,

    /// 1-based page number
    pub page: u32,
}

impl SearchResultPage {
    pub fn empty(page: u32) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            has_more: false,
            page,
        }
    }
}

/// Free-text search request sent to the listing API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    pub filters: FilterState,
    pub page: u32,
    pub limit: u32,
}

/// Response of the free-text search endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub properties: Vec<Property>,
    pub total: u64,
}

/// Response of the filter-only listing endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredResponse {
    pub properties: Vec<Property>,
    pub total: u64,
    pub has_more: bool,
}

/// Autocomplete suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub text: String,

    /// Suggestion category, e.g. `location` or `title`
    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub count: u64,
}

/// Criteria stored with a saved search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub filters: FilterState,
    #[serde(default)]
    pub sort: SortSpec,
}

/// Server-side saved search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSearch {
    pub id: String,
    pub name: String,
    pub criteria: SearchCriteria,
    pub created_at: DateTime<Utc>,
}

/// Membership reported by the favorite toggle endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteToggle {
    pub property_id: PropertyId,
    pub is_favorite: bool,
}

/// A past search kept in local history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    pub query: String,
    pub filters: FilterState,
    pub result_count: u64,
    pub timestamp: DateTime<Utc>,
}

/// Named filter combination stored locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPreset {
    pub id: Uuid,
    pub name: String,
    pub filters: FilterState,
    pub sort: SortSpec,
    pub created_at: DateTime<Utc>,
}

impl FilterPreset {
    pub fn new(name: impl Into<String>, filters: FilterState, sort: SortSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            filters,
            sort,
            created_at: Utc::now(),
        }
    }
}
