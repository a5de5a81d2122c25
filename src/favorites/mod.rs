//! Favorite membership with optimistic toggles

pub mod service;
pub mod state;

pub use service::FavoritesService;
pub use state::{FavoriteSet, MutationState};
