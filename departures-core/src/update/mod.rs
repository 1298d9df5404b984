//! Update orchestration.
//!
//! The coordinator decides when a refresh is due, coalesces concurrent
//! refresh requests into a single in-flight fetch, checks the cached
//! snapshot for freshness and proximity, writes successful results
//! through to the store, and publishes observable state.

mod config;
mod coordinator;
mod status;

pub use config::UpdateConfig;
pub use coordinator::{RefreshResult, UpdateCoordinator, UpdateError};
pub use status::UpdateStatus;
