//! HTTP client for the departures backend.
//!
//! The backend's `nearest` endpoint returns precomputed nearest-station
//! departure data as JSON. This module consumes it as an opaque service:
//! build the query URL from a coordinate and the filter selection, issue
//! one GET, decode the response. It implements no transit logic of its
//! own.

mod client;
mod error;
mod mock;
mod types;

pub use client::{ClientConfig, DeparturesClient, NearestDepartures};
pub use error::FetchError;
pub use mock::MockNearestClient;
pub use types::NearestResponse;
