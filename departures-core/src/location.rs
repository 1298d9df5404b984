//! Location events and geographic distance.
//!
//! The coordinator consumes a channel of [`LocationEvent`]s instead of
//! talking to any platform location API directly; whatever acquires device
//! positions (GPS, test fixture) feeds the channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, for great-circle distance.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle (haversine) distance to another coordinate, in meters.
    pub fn distance_meters(&self, other: &Coordinate) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }
}

/// One position report from the location provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub coordinate: Coordinate,
    /// Horizontal accuracy radius in meters.
    pub accuracy_m: f64,
    pub timestamp: DateTime<Utc>,
}

/// Events delivered by the external location provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationEvent {
    /// A new position is available.
    Fix(LocationFix),
    /// The user has denied location permission. Terminal until a later
    /// `Fix` arrives; never retried on a timer.
    PermissionDenied,
    /// The provider failed transiently (no signal, hardware error).
    Unavailable,
}
