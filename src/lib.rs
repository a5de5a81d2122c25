//! Search, filter and result-cache core of the listing screens
//!
//! - [`search::query`] turns free text into a residual query plus filters
//! - [`filters`] holds filter/sort state and mirrors it to the URL and storage
//! - [`search::SearchService`] fetches, caches and pages results
//! - [`search::fallback`] refines and sorts fetched results client-side
//! - [`favorites::FavoritesService`] toggles favorites optimistically

pub mod api;
pub mod config;
pub mod error;
pub mod favorites;
pub mod filters;
pub mod metrics;
pub mod models;
pub mod search;
pub mod state;

pub use error::{AppError, Result};
