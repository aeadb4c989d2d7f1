//! Memoizing address-to-coordinate resolver.
//!
//! Successful lookups are cached by exact address string for the session.
//! Failures are logged and resolve to `None`; they are not cached, so a
//! later render may try again.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use fleetdash_api::{ApiError, GoogleMapsClient};
use fleetdash_core::Coordinates;

pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Anything that can turn a free-text address into a point.
pub trait Geocoder: Send + Sync {
    /// # Errors
    ///
    /// Implementation-defined; callers treat every error as "unresolved".
    fn geocode(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Option<Coordinates>, ApiError>> + Send;
}

impl Geocoder for GoogleMapsClient {
    fn geocode(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Option<Coordinates>, ApiError>> + Send {
        GoogleMapsClient::geocode(self, address)
    }
}

#[derive(Debug, Default)]
struct Entries {
    by_address: HashMap<String, Coordinates>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
}

/// Bounded FIFO cache in front of a [`Geocoder`].
///
/// Concurrent misses for the same address are not coalesced; each one
/// calls the geocoder.
pub struct GeocodeCache<G> {
    geocoder: G,
    capacity: usize,
    entries: Mutex<Entries>,
}

impl<G: Geocoder> GeocodeCache<G> {
    #[must_use]
    pub fn new(geocoder: G, capacity: usize) -> Self {
        Self {
            geocoder,
            capacity: capacity.max(1),
            entries: Mutex::new(Entries::default()),
        }
    }

    /// Resolves `address`, consulting the cache first.
    pub async fn resolve(&self, address: &str) -> Option<Coordinates> {
        if address.trim().is_empty() {
            return None;
        }
        if let Some(hit) = self.cached(address) {
            return Some(hit);
        }

        match self.geocoder.geocode(address).await {
            Ok(Some(point)) => {
                self.insert(address, point);
                Some(point)
            }
            Ok(None) => {
                tracing::debug!(address, "geocoder found no match");
                None
            }
            Err(e) => {
                tracing::debug!(address, error = %e, "geocoding failed");
                None
            }
        }
    }

    #[must_use]
    pub fn cached(&self, address: &str) -> Option<Coordinates> {
        self.lock().by_address.get(address).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().by_address.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, address: &str, point: Coordinates) {
        let mut entries = self.lock();
        if entries
            .by_address
            .insert(address.to_owned(), point)
            .is_some()
        {
            return;
        }
        entries.order.push_back(address.to_owned());
        while entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.by_address.remove(&oldest);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
