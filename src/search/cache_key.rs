//! Composite keys for the result cache

use crate::models::FilterState;
use crate::search::query::normalize_whitespace;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

/// Which listing API call produced a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QueryKind {
    /// Free-text search endpoint
    Search,
    /// Filter-only listing endpoint
    Filter,
}

impl QueryKind {
    /// Free text goes to the search endpoint, everything else to the listing endpoint
    pub fn for_query(normalized_query: &str) -> Self {
        if normalized_query.is_empty() {
            QueryKind::Filter
        } else {
            QueryKind::Search
        }
    }
}

/// Deterministic identity of one `(kind, query, filters, page, page size)` request.
///
/// The key is the JSON encoding of the tuple. String escaping keeps distinct
/// tuples distinct, and struct field order keeps equal tuples equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(kind: QueryKind, query: &str, filters: &FilterState, page: u32, page_size: u32) -> Self {
        let normalized_query = normalize_query(query);
        let normalized_filters = filters.normalized();
        let encoded = serde_json::to_string(&(kind, &normalized_query, &normalized_filters, page, page_size))
            .unwrap_or_else(|_| format!("{kind}|{normalized_query:?}|{normalized_filters:?}|{page}|{page_size}"));
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lower-case, whitespace-collapsed form of a text query
pub fn normalize_query(query: &str) -> String {
    normalize_whitespace(query).to_lowercase()
}
