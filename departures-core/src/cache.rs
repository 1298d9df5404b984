//! Single-slot persisted snapshot cache.
//!
//! At most one departures snapshot exists at a time: a new successful
//! fetch overwrites the slot entirely, and an expired slot is deleted the
//! moment it is read. The store only knows age-based expiry; proximity
//! checks against the snapshot's fetch location are the coordinator's job.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::StationDepartures;
use crate::location::Coordinate;

/// One fetched-and-cached batch of per-station departure lists, tied to
/// the location and time of the fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedSnapshot {
    pub stns_deps: Vec<StationDepartures>,

    /// When the fetch completed.
    #[serde(rename = "time", with = "epoch_seconds")]
    pub fetched_at: DateTime<Utc>,

    /// Location the server resolved the fetch against.
    pub lat: f64,
    pub lng: f64,
}

impl CachedSnapshot {
    pub fn fetch_location(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }

    /// Age of the snapshot relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.fetched_at
    }
}

/// Errors from writing the snapshot slot. Read-side failures are absorbed
/// and never surface as errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to write snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persistent store for the single snapshot slot.
///
/// The slot is one JSON blob (`{"stnsDeps": [...], "time": <epoch secs>,
/// "lat": .., "lng": ..}`) at a fixed path, matching the shared key-value
/// record the apps exchange with the widget.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the snapshot, unconditionally replacing any prior value.
    ///
    /// Writes to a sibling temp file and renames into place so a crash
    /// mid-write cannot leave a truncated slot.
    pub fn store(&self, snapshot: &CachedSnapshot) -> Result<(), CacheError> {
        let json = serde_json::to_vec(snapshot)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), stations = snapshot.stns_deps.len(), "stored snapshot");
        Ok(())
    }

    /// Read the slot, returning `None` if it is absent, older than
    /// `max_age`, or unreadable.
    ///
    /// An expired or corrupt slot is deleted on read; expired entries are
    /// never returned, not even once. Deserialization failure is treated
    /// identically to absence.
    pub fn retrieve(&self, max_age: Duration) -> Option<CachedSnapshot> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read snapshot slot");
                return None;
            }
        };

        let snapshot: CachedSnapshot = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt snapshot slot, discarding");
                self.clear();
                return None;
            }
        };

        let age = snapshot.age(Utc::now());
        let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
        if age >= max_age {
            debug!(age_secs = age.num_seconds(), "snapshot expired, discarding");
            self.clear();
            return None;
        }

        Some(snapshot)
    }

    /// Delete the slot if present.
    pub fn clear(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to delete snapshot slot");
            }
        }
    }
}

/// Serde shim: `DateTime<Utc>` as epoch seconds with fractional part.
mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        let secs = dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) * 1e-9;
        serializer.serialize_f64(secs)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        let micros = (secs * 1_000_000.0).round() as i64;
        DateTime::from_timestamp_micros(micros)
            .ok_or_else(|| de::Error::custom(format!("epoch seconds out of range: {secs}")))
    }
}
