//! Domain types for nearby departures.
//!
//! Immutable value types plus the pure merge algorithm that collapses raw
//! per-stop departure records into display-ready grouped rows. No I/O and
//! no shared mutable state lives here.

mod departure;
mod merge;
mod station;

pub use departure::{
    Departure, StationDepartures, format_line_name, shorten_destination,
};
pub use merge::{MergedRow, merge_departures};
pub use station::{Station, shorten_station_name};
