use crate::api::PropertyApi;
use crate::error::Result;
use crate::favorites::state::{FavoriteSet, MutationState};
use crate::metrics::{observe_fetch, FAVORITE_TOGGLES_TOTAL};
use crate::models::{Property, PropertyId};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Optimistic favorite toggling with rollback to server truth.
///
/// Toggles for the same id are queued behind a per-id lock and decide their
/// direction only once they hold it, so a double click adds then removes.
/// Toggles for different ids run concurrently.
///
/// Every settled toggle bumps a mutation epoch. A refresh remembers the epoch
/// it started at and, when it lands, re-applies memberships settled after
/// that point, so an older server snapshot never undoes a newer toggle.
pub struct FavoritesService {
    api: Arc<dyn PropertyApi>,
    set: RwLock<FavoriteSet>,
    locks: DashMap<PropertyId, Arc<Mutex<()>>>,
    /// Optimistic membership of toggles still waiting for the server
    pending: DashMap<PropertyId, bool>,
    /// Membership reported by the last settled toggle per id, with its epoch
    settled: DashMap<PropertyId, (u64, bool)>,
    states: DashMap<PropertyId, MutationState>,
    refresh_seq: AtomicU64,
    epoch: AtomicU64,
    /// Set while some favorited ids have no listing data
    needs_refresh: AtomicBool,
}

impl FavoritesService {
    pub fn new(api: Arc<dyn PropertyApi>) -> Self {
        Self {
            api,
            set: RwLock::new(FavoriteSet::default()),
            locks: DashMap::new(),
            pending: DashMap::new(),
            settled: DashMap::new(),
            states: DashMap::new(),
            refresh_seq: AtomicU64::new(0),
            epoch: AtomicU64::new(0),
            needs_refresh: AtomicBool::new(false),
        }
    }

    /// Initial fetch
    pub async fn load(&self) -> Result<()> {
        self.refresh().await?;
        info!(count = self.set.read().ids.len(), "Favorites loaded");
        Ok(())
    }

    pub fn is_favorite(&self, id: PropertyId) -> bool {
        self.set.read().contains(id)
    }

    pub fn favorites(&self) -> Vec<Property> {
        self.set.read().favorites.clone()
    }

    pub fn favorite_ids(&self) -> BTreeSet<PropertyId> {
        self.set.read().ids.clone()
    }

    pub fn mutation_state(&self, id: PropertyId) -> MutationState {
        self.states.get(&id).map(|s| *s.value()).unwrap_or_default()
    }

    pub fn is_pending(&self, id: PropertyId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Whether a refetch after a settled toggle failed and the display list
    /// is missing entries. The next `refresh`, `load` or `toggle` retries.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh.load(Ordering::SeqCst)
    }

    /// Replace local state with the server's favorites.
    ///
    /// A refresh overtaken by a newer one is discarded. Toggles settled after
    /// the fetch started, and toggles still in flight, are re-applied on top
    /// of the fetched list.
    pub async fn refresh(&self) -> Result<()> {
        let seq = self.refresh_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let started_at = self.epoch.load(Ordering::SeqCst);

        let start = Instant::now();
        let result = self.api.get_favorite_properties().await;
        observe_fetch("favorites", result.is_ok(), start.elapsed());
        let favorites = result?;

        let mut current = self.set.write();
        if self.refresh_seq.load(Ordering::SeqCst) != seq {
            debug!(seq, "Discarding superseded favorites refresh");
            return Ok(());
        }

        let mut set = FavoriteSet::from_properties(favorites);
        for entry in self.settled.iter() {
            let (epoch, member) = *entry.value();
            if epoch > started_at {
                debug!(id = *entry.key(), epoch, started_at, "Re-applying toggle settled during refresh");
                set.set(*entry.key(), member);
            }
        }
        for entry in self.pending.iter() {
            set.set(*entry.key(), *entry.value());
        }
        self.settled.retain(|_, (epoch, _)| *epoch > started_at);

        self.needs_refresh.store(self.lacks_details(&set), Ordering::SeqCst);
        *current = set;
        Ok(())
    }

    /// Flip favorite membership of `id`.
    ///
    /// Returns the membership the server reports. On failure the local
    /// change is undone and the error is returned to the caller.
    pub async fn toggle(&self, id: PropertyId) -> Result<bool> {
        let lock = self.locks.entry(id).or_default().clone();
        let _guard = lock.lock().await;

        if self.needs_refresh() {
            self.refresh_quietly().await;
        }

        let adding = {
            let mut set = self.set.write();
            let adding = !set.contains(id);
            set.set(id, adding);
            self.pending.insert(id, adding);
            adding
        };
        self.states.insert(id, MutationState::Pending);
        debug!(id, adding, "Applied optimistic favorite toggle");

        let start = Instant::now();
        let result = self.api.toggle_favorite(id).await;
        observe_fetch("toggle", result.is_ok(), start.elapsed());

        match result {
            Ok(toggle) => {
                let outcome = if toggle.is_favorite == adding {
                    "confirmed"
                } else {
                    warn!(id, expected = adding, reported = toggle.is_favorite, "Server disagreed with favorite toggle");
                    "reconciled"
                };
                self.settle(id, toggle.is_favorite);
                if toggle.is_favorite {
                    self.refresh_quietly().await;
                }
                self.states.insert(id, MutationState::Confirmed);
                FAVORITE_TOGGLES_TOTAL.with_label_values(&[outcome]).inc();
                Ok(toggle.is_favorite)
            }
            Err(e) => {
                warn!(id, adding, error = %e, "Favorite toggle failed, rolling back");
                self.settle(id, !adding);
                if !adding {
                    self.refresh_quietly().await;
                }
                self.states.insert(id, MutationState::RolledBack);
                FAVORITE_TOGGLES_TOTAL.with_label_values(&["rolled_back"]).inc();
                Err(e)
            }
        }
    }

    /// Record the final membership of `id` and apply it locally
    fn settle(&self, id: PropertyId, member: bool) {
        let mut set = self.set.write();
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.settled.insert(id, (epoch, member));
        self.pending.remove(&id);
        set.set(id, member);
    }

    /// Settled favorites without listing data; in-flight adds are expected to lack it
    fn lacks_details(&self, set: &FavoriteSet) -> bool {
        set.ids_without_details()
            .into_iter()
            .any(|id| !self.pending.contains_key(&id))
    }

    async fn refresh_quietly(&self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Favorites refresh failed");
            if self.lacks_details(&self.set.read()) {
                self.needs_refresh.store(true, Ordering::SeqCst);
            }
        }
    }
}
