//! Query interpretation, result caching and client-side refinement
//!
//! ```text
//!  free text ──► query::parse ──► FilterStore
//!                                     │
//!                                     ▼
//!               SearchService ──► ResultCache (CacheKey)
//!                     │                │ miss
//!                     │                ▼
//!                     │           PropertyApi
//!                     ▼
//!          fallback::refine ──► rendered list
//! ```
//!
//! # Example
//!
//! ```no_run
//! use listing_search::api::HttpPropertyApi;
//! use listing_search::config::Config;
//! use listing_search::search::{self, SearchService};
//! use listing_search::models::{FilterState, SortSpec};
//! use std::sync::Arc;
//!
//! # async fn run() -> listing_search::Result<()> {
//! let config = Config::default();
//! let api = Arc::new(HttpPropertyApi::new(&config.api)?);
//! let service = SearchService::new(api, config.search.clone());
//!
//! let parsed = search::parse("2 bhk apartment for rent");
//! let mut filters = FilterState::baseline();
//! filters.merge(&parsed.extracted_filters);
//!
//! service.search(&parsed.clean_query, &filters).await;
//! service.load_more().await;
//! let listings = service.results(&SortSpec::default());
//! # Ok(())
//! # }
//! ```

pub mod cache_key;
pub mod fallback;
pub mod query;
mod service;

pub use cache_key::{normalize_query, CacheKey, QueryKind};
pub use fallback::{filter_properties, refine, sort_properties};
pub use query::{parse, ParsedQuery};
pub use service::{SearchService, SearchSnapshot};
