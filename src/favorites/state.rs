use crate::models::{Property, PropertyId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{Display, EnumString};

/// Lifecycle of one favorite toggle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MutationState {
    /// No toggle has run for this id
    #[default]
    Idle,
    /// Applied locally, waiting for the server
    Pending,
    /// Server answered; local state follows its reported membership
    Confirmed,
    /// Server call failed; the optimistic change was undone
    RolledBack,
}

impl MutationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MutationState::Confirmed | MutationState::RolledBack)
    }
}

/// Ids believed to be favorited plus the display list.
///
/// Outside an in-flight toggle `ids` equals the ids of `favorites`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoriteSet {
    pub ids: BTreeSet<PropertyId>,
    pub favorites: Vec<Property>,
}

impl FavoriteSet {
    pub fn from_properties(favorites: Vec<Property>) -> Self {
        Self {
            ids: favorites.iter().map(|p| p.id).collect(),
            favorites,
        }
    }

    pub fn contains(&self, id: PropertyId) -> bool {
        self.ids.contains(&id)
    }

    /// Mark `id` as favorited; full data arrives with the next refresh
    pub fn insert(&mut self, id: PropertyId) {
        self.ids.insert(id);
    }

    pub fn remove(&mut self, id: PropertyId) {
        self.ids.remove(&id);
        self.favorites.retain(|p| p.id != id);
    }

    /// Ids marked as favorites whose listing data has not been fetched yet
    pub fn ids_without_details(&self) -> BTreeSet<PropertyId> {
        let detailed: BTreeSet<PropertyId> = self.favorites.iter().map(|p| p.id).collect();
        self.ids.difference(&detailed).copied().collect()
    }

    /// Force membership of `id` to `member`
    pub fn set(&mut self, id: PropertyId, member: bool) {
        if member {
            self.insert(id);
        } else {
            self.remove(id);
        }
    }
}
