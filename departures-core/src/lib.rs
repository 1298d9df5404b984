//! Nearby public-transit departures core.
//!
//! The update/caching/deduplication engine behind a departures app:
//! decides when a refresh of departure data is due, coalesces concurrent
//! refresh requests into one in-flight network operation, caches the last
//! successful snapshot by recency and geographic displacement, and merges
//! raw per-stop departure records into display-ready grouped rows.
//! Map, list and widget rendering sit above this crate.

pub mod api;
pub mod cache;
pub mod domain;
pub mod location;
pub mod settings;
pub mod update;
