use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::watch;

use crate::api::SightingApi;
use crate::error::ApiError;
use crate::record::{Sighting, SightingId, SightingPatch, UserId};

/// Whether a local mutation was confirmed by the backend.
///
/// `LocalOnly` marks the inconsistency window: local state already changed, the
/// backend did not accept it, and nothing will reconcile it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Confirmed,
    LocalOnly,
}

pub type Snapshot = Arc<Vec<Sighting>>;

/// The authoritative in-memory sighting collection, kept in step with a backend.
///
/// Every mutation swaps in a new collection, so a [`Snapshot`] taken earlier never
/// changes underneath its holder. Subscribers are notified after each swap.
pub struct SightingStore<B> {
    backend: B,
    sightings: watch::Sender<Snapshot>,
}

impl<B: SightingApi> SightingStore<B> {
    pub fn new(backend: B) -> Self {
        let (sightings, _) = watch::channel(Arc::new(Vec::new()));
        Self { backend, sightings }
    }

    /// Replace local state with the backend's full collection.
    ///
    /// On failure the previous collection is kept and the error is returned.
    pub async fn load_all(&self) -> Result<usize, ApiError> {
        match self.backend.fetch_all().await {
            Ok(list) => {
                let count = list.len();
                self.sightings.send_replace(Arc::new(list));
                info!("Loaded {} sightings", count);
                Ok(count)
            }
            Err(e) => {
                error!("Failed to load sightings, keeping {} cached: {}", self.len(), e);
                Err(e)
            }
        }
    }

    /// Create a sighting and append it to the collection.
    ///
    /// The record always lands locally: with the backend id when the create succeeds,
    /// with its own client id when it does not. Ids stay unique: a record already
    /// holding the resulting id is replaced in place.
    pub async fn add(&self, mut sighting: Sighting) -> (Sighting, SyncOutcome) {
        sighting.quantity = sighting.quantity.max(1);

        let outcome = match self.backend.create(&sighting).await {
            Ok(id) => {
                debug!("Sighting {} confirmed as {}", sighting.id, id);
                sighting.id = id;
                SyncOutcome::Confirmed
            }
            Err(e) => {
                warn!(
                    "Failed to create sighting on backend, keeping local id {}: {}",
                    sighting.id, e
                );
                SyncOutcome::LocalOnly
            }
        };

        self.sightings.send_modify(|list| {
            let next = Arc::make_mut(list);
            match next.iter().position(|s| s.id == sighting.id) {
                Some(index) => {
                    warn!("Sighting {} already present, replacing it", sighting.id);
                    next[index] = sighting.clone();
                }
                None => next.push(sighting.clone()),
            }
        });
        (sighting, outcome)
    }

    /// Merge `patch` into the sighting with `id`, locally first, then push the merged
    /// record to the backend. Returns `None` without any request if `id` is unknown.
    pub async fn update(
        &self,
        id: &SightingId,
        patch: &SightingPatch,
    ) -> Option<(Sighting, SyncOutcome)> {
        let mut merged = None;
        self.sightings.send_if_modified(|list| {
            let Some(index) = list.iter().position(|s| &s.id == id) else {
                return false;
            };
            let next = Arc::make_mut(list);
            next[index].apply(patch);
            merged = Some(next[index].clone());
            true
        });

        let Some(merged) = merged else {
            debug!("Update ignored, no sighting {}", id);
            return None;
        };

        let outcome = match self.backend.replace(&merged).await {
            Ok(()) => SyncOutcome::Confirmed,
            Err(e) => {
                warn!("Failed to update sighting {} on backend: {}", id, e);
                SyncOutcome::LocalOnly
            }
        };
        Some((merged, outcome))
    }

    /// Delete the sighting with `id`. The local record goes away once the request
    /// completes, whatever its outcome. Returns `None` if `id` is unknown.
    pub async fn remove(&self, id: &SightingId) -> Option<SyncOutcome> {
        if self.get(id).is_none() {
            debug!("Remove ignored, no sighting {}", id);
            return None;
        }

        let outcome = match self.backend.delete(id).await {
            Ok(()) => SyncOutcome::Confirmed,
            Err(e) => {
                warn!("Failed to delete sighting {} on backend: {}", id, e);
                SyncOutcome::LocalOnly
            }
        };

        self.sightings.send_if_modified(|list| {
            match list.iter().position(|s| &s.id == id) {
                Some(index) => {
                    Arc::make_mut(list).remove(index);
                    true
                }
                None => false,
            }
        });
        Some(outcome)
    }

    /// All sightings owned by `user_id`, in collection order.
    pub fn sightings_by_user(&self, user_id: &UserId) -> Vec<Sighting> {
        self.sightings
            .borrow()
            .iter()
            .filter(|s| s.is_owned_by(user_id))
            .cloned()
            .collect()
    }

    /// Sightings of the signed-in account, also matching rows the backend stored
    /// by username only.
    pub fn sightings_by_account(&self, user_id: &UserId, username: &str) -> Vec<Sighting> {
        self.sightings
            .borrow()
            .iter()
            .filter(|s| s.is_owned_by_account(user_id, username))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &SightingId) -> Option<Sighting> {
        self.sightings.borrow().iter().find(|s| &s.id == id).cloned()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.sightings.borrow().clone()
    }

    /// Receiver that wakes after every change to the collection.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.sightings.subscribe()
    }

    pub fn len(&self) -> usize {
        self.sightings.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sightings.borrow().is_empty()
    }
}
