//! Departures API response DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::StationDepartures;

/// Response from the `nearest` endpoint.
///
/// `lat`/`lng` echo the coordinate the server resolved the query against;
/// the cached snapshot records that echoed location rather than the raw
/// device position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestResponse {
    /// Nearest stations with their upcoming departures, ordered by the
    /// server (closest first).
    pub stns_deps: Vec<StationDepartures>,

    pub lat: f64,
    pub lng: f64,
}
