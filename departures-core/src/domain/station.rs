//! Station value type.

use serde::{Deserialize, Serialize};

/// A transit station as reported by the departures API.
///
/// Identity is the stable stop identifier `id`; coordinates and name are
/// descriptive. Two `Station` values with the same `id` refer to the same
/// physical station even if the other fields differ between fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Stable stop identifier (e.g. a NaPTAN code).
    pub id: String,
    pub lat: f32,
    pub lon: f32,
    /// Full station name, often with a verbose suffix
    /// ("... Underground Station").
    pub name: String,
}

impl Station {
    /// Station name with the verbose suffix stripped, for display.
    ///
    /// Stripping is presentation only; `name` remains the canonical value.
    pub fn display_name(&self) -> String {
        shorten_station_name(&self.name)
    }
}

/// Strip the verbose station-type suffixes from a station name.
pub fn shorten_station_name(name: &str) -> String {
    name.replace(" Underground Station", "")
        .replace(" Rail Station", "")
        .replace(" DLR Station", "")
}
