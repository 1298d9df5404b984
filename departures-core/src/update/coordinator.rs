//! The update coordinator: refresh scheduling, deduplication, caching.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{debug, info, warn};

use crate::api::{FetchError, NearestDepartures};
use crate::cache::{CachedSnapshot, SnapshotStore};
use crate::domain::StationDepartures;
use crate::location::{Coordinate, LocationEvent, LocationFix};
use crate::settings::FilterSelection;

use super::config::UpdateConfig;
use super::status::UpdateStatus;

/// Errors surfaced by [`UpdateCoordinator::refresh`].
///
/// `Clone` so the result of a deduplicated refresh can fan out to every
/// caller awaiting it; the underlying fetch error is shared via `Arc`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpdateError {
    /// No coordinate is known yet, or location permission was denied.
    /// Not retried on a timer; cleared by the next location fix.
    #[error("location unavailable")]
    LocationUnavailable,

    /// The fetch failed; previously published data is untouched.
    #[error("fetch failed: {0}")]
    Fetch(Arc<FetchError>),
}

/// Result every caller of a refresh generation receives.
pub type RefreshResult = Result<Arc<Vec<StationDepartures>>, UpdateError>;

type SharedRefresh = Shared<BoxFuture<'static, RefreshResult>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastOutcome {
    Completed,
    Failed,
}

/// State visible to observers. Mutated only with the write lock held, so
/// data, timestamps and status always change together.
#[derive(Default)]
struct Published {
    fetching_since: Option<DateTime<Utc>>,
    /// Last good data and when it was fetched. Survives later failures.
    last_good: Option<(Arc<Vec<StationDepartures>>, DateTime<Utc>)>,
    last_attempt: Option<DateTime<Utc>>,
    last_outcome: Option<LastOutcome>,
}

impl Published {
    fn status(&self) -> UpdateStatus {
        if let Some(attempt_started_at) = self.fetching_since {
            return UpdateStatus::Fetching { attempt_started_at };
        }
        match (self.last_outcome, &self.last_good) {
            (Some(LastOutcome::Completed), Some((data, updated_at))) => {
                if data.is_empty() {
                    UpdateStatus::NoResults {
                        updated_at: *updated_at,
                    }
                } else {
                    UpdateStatus::Loaded {
                        data: Arc::clone(data),
                        updated_at: *updated_at,
                    }
                }
            }
            (Some(LastOutcome::Failed), _) => UpdateStatus::Error,
            _ => UpdateStatus::Initial,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LocationState {
    Unknown,
    Known(LocationFix),
    /// Permission denied: terminal until a new fix arrives.
    Denied,
}

struct Inner<C> {
    client: C,
    store: SnapshotStore,
    config: UpdateConfig,
    filters: RwLock<FilterSelection>,
    location: RwLock<LocationState>,
    published: RwLock<Published>,
    /// The single pending-refresh slot. Holding the mutex while deciding
    /// whether to attach or start is what guarantees at most one fetch is
    /// ever in flight.
    pending: Mutex<Option<SharedRefresh>>,
}

/// Orchestrates departure refreshes.
///
/// Owns its collaborators (fetch client, snapshot store, filters) as
/// injected dependencies; create one per app surface and share clones.
/// Guarantees at most one network fetch is in flight at a time regardless
/// of how many callers request a refresh concurrently, and publishes
/// state transitions atomically.
pub struct UpdateCoordinator<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for UpdateCoordinator<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: NearestDepartures> UpdateCoordinator<C> {
    pub fn new(client: C, store: SnapshotStore, config: UpdateConfig, filters: FilterSelection) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                store,
                config,
                filters: RwLock::new(filters),
                location: RwLock::new(LocationState::Unknown),
                published: RwLock::new(Published::default()),
                pending: Mutex::new(None),
            }),
        }
    }

    /// Current display status.
    pub async fn status(&self) -> UpdateStatus {
        self.inner.published.read().await.status()
    }

    /// Last good data, readable even while fetching or after a failure.
    pub async fn departures(&self) -> Option<Arc<Vec<StationDepartures>>> {
        self.inner
            .published
            .read()
            .await
            .last_good
            .as_ref()
            .map(|(data, _)| Arc::clone(data))
    }

    /// Whether a fetch is currently in flight.
    pub async fn is_refreshing(&self) -> bool {
        self.inner.published.read().await.fetching_since.is_some()
    }

    /// Whole minutes since the last successful update, floored.
    pub async fn minutes_since_update(&self, now: DateTime<Utc>) -> Option<i64> {
        self.inner
            .published
            .read()
            .await
            .last_good
            .as_ref()
            .map(|(_, at)| (now - *at).num_seconds().div_euclid(60))
    }

    /// Whole minutes since the last refresh attempt, floored.
    pub async fn minutes_since_attempt(&self, now: DateTime<Utc>) -> Option<i64> {
        self.inner
            .published
            .read()
            .await
            .last_attempt
            .map(|at| (now - at).num_seconds().div_euclid(60))
    }

    /// Whether a device coordinate is currently known.
    pub async fn location_available(&self) -> bool {
        matches!(*self.inner.location.read().await, LocationState::Known(_))
    }

    /// Whether the user has denied location permission.
    pub async fn permission_denied(&self) -> bool {
        matches!(*self.inner.location.read().await, LocationState::Denied)
    }

    pub async fn filters(&self) -> FilterSelection {
        self.inner.filters.read().await.clone()
    }

    /// Replace the filter selection used for subsequent fetches.
    pub async fn set_filters(&self, filters: FilterSelection) {
        *self.inner.filters.write().await = filters;
    }

    /// Record a new device position without triggering a refresh.
    pub async fn set_location(&self, fix: LocationFix) {
        *self.inner.location.write().await = LocationState::Known(fix);
    }

    /// React to one event from the location feed.
    ///
    /// A fix records the position and triggers a non-forced refresh (the
    /// cache decides whether the network is actually hit). Permission
    /// denial enters a terminal locationless state that only a later fix
    /// clears; it is never retried on a timer.
    pub async fn handle_location_event(&self, event: LocationEvent) {
        match event {
            LocationEvent::Fix(fix) => {
                debug!(lat = fix.coordinate.lat, lng = fix.coordinate.lng, "location fix");
                self.set_location(fix).await;
                // Refresh failures are already published; nothing to do here.
                let _ = self.refresh(false).await;
            }
            LocationEvent::PermissionDenied => {
                warn!("location permission denied");
                *self.inner.location.write().await = LocationState::Denied;
            }
            LocationEvent::Unavailable => {
                debug!("location unavailable");
                *self.inner.location.write().await = LocationState::Unknown;
            }
        }
    }

    /// Refresh departure data.
    ///
    /// If a fetch is already in flight, attaches to it instead of starting
    /// a second one; all concurrent callers receive the same result. When
    /// not forced, a fresh cached snapshot fetched within
    /// `cache_distance_m` of the current location is accepted without any
    /// network call.
    pub async fn refresh(&self, force: bool) -> RefreshResult {
        let shared = {
            let mut pending = self.inner.pending.lock().await;
            // A completed leftover future is never reused; a new call
            // right after completion starts fresh work.
            match pending.as_ref().filter(|f| f.peek().is_none()) {
                Some(existing) => {
                    debug!("refresh already in flight, attaching");
                    existing.clone()
                }
                None => {
                    let inner = Arc::clone(&self.inner);
                    let fut = async move {
                        let result = Inner::perform_refresh(&inner, force).await;
                        *inner.pending.lock().await = None;
                        result
                    }
                    .boxed()
                    .shared();
                    *pending = Some(fut.clone());
                    fut
                }
            }
        };
        shared.await
    }

    /// Apply the self-healing catch-up rule once: if the last successful
    /// update is older than `stale_after` and the last attempt is older
    /// than `min_attempt_spacing`, trigger a forced refresh. Returns
    /// whether a refresh was triggered.
    pub async fn catch_up_if_stale(&self) -> bool {
        if !self.location_available().await {
            return false;
        }

        let now = Utc::now();
        {
            let published = self.inner.published.read().await;
            if published.fetching_since.is_some() {
                return false;
            }
            let stale_after = as_chrono(self.inner.config.stale_after);
            let spacing = as_chrono(self.inner.config.min_attempt_spacing);

            let stale = match &published.last_good {
                Some((_, at)) => now - *at >= stale_after,
                None => true,
            };
            let spaced = match published.last_attempt {
                Some(at) => now - at >= spacing,
                None => true,
            };
            if !stale || !spaced {
                return false;
            }
        }

        info!("data is stale, self-triggering forced refresh");
        let _ = self.refresh(true).await;
        true
    }

    /// Drive the coordinator from a location feed.
    ///
    /// Consumes location events and periodically evaluates the catch-up
    /// rule; returns when the feed closes.
    pub async fn run(&self, mut events: mpsc::Receiver<LocationEvent>) {
        let mut interval = tokio::time::interval(self.inner.config.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await; // First tick is immediate, skip it

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_location_event(event).await,
                    None => break,
                },
                _ = interval.tick() => {
                    self.catch_up_if_stale().await;
                }
            }
        }
        debug!("location feed closed, update driver stopping");
    }
}

impl<C: NearestDepartures> Inner<C> {
    async fn current_coordinate(&self) -> Option<Coordinate> {
        match *self.location.read().await {
            LocationState::Known(fix) => Some(fix.coordinate),
            _ => None,
        }
    }

    /// One refresh generation. Runs inside the shared pending future, so
    /// at most one instance executes at a time.
    async fn perform_refresh(self: &Arc<Self>, force: bool) -> RefreshResult {
        let current = self.current_coordinate().await;

        if !force {
            if let Some(snapshot) = self.store.retrieve(self.config.cache_max_age) {
                let close_enough = current.is_some_and(|loc| {
                    loc.distance_meters(&snapshot.fetch_location()) < self.config.cache_distance_m
                });
                if close_enough {
                    debug!(
                        age_secs = snapshot.age(Utc::now()).num_seconds(),
                        "using cached snapshot"
                    );
                    return Ok(self.publish_snapshot(snapshot).await);
                }
            }
        }

        let Some(location) = current else {
            return Err(UpdateError::LocationUnavailable);
        };
        let filters = self.filters.read().await.clone();

        let started = Utc::now();
        {
            let mut published = self.published.write().await;
            published.fetching_since = Some(started);
            published.last_attempt = Some(started);
        }
        info!(lat = location.lat, lng = location.lng, "refreshing departures");

        match self.client.fetch_nearest(location, &filters).await {
            Ok(response) => {
                let snapshot = CachedSnapshot {
                    stns_deps: response.stns_deps,
                    fetched_at: Utc::now(),
                    lat: response.lat,
                    lng: response.lng,
                };
                if let Err(e) = self.store.store(&snapshot) {
                    // A cache write failure must not fail the refresh.
                    warn!(error = %e, "failed to write snapshot cache");
                }
                let data = self.publish_snapshot(snapshot).await;
                info!(stations = data.len(), "departures updated");
                Ok(data)
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "departure refresh failed");
                let mut published = self.published.write().await;
                published.fetching_since = None;
                published.last_outcome = Some(LastOutcome::Failed);
                Err(UpdateError::Fetch(Arc::new(e)))
            }
        }
    }

    /// Publish a completed snapshot atomically: data, timestamp and
    /// status change under one lock.
    async fn publish_snapshot(&self, snapshot: CachedSnapshot) -> Arc<Vec<StationDepartures>> {
        let data = Arc::new(snapshot.stns_deps);
        let mut published = self.published.write().await;
        published.fetching_since = None;
        published.last_good = Some((Arc::clone(&data), snapshot.fetched_at));
        published.last_outcome = Some(LastOutcome::Completed);
        data
    }
}

fn as_chrono(d: std::time::Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}
