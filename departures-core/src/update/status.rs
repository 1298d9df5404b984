//! Published coordinator status.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::StationDepartures;

/// Display status of the update coordinator.
///
/// This is a collapsed view of two orthogonal axes (have-data,
/// are-fetching): while a refresh is in flight the status is `Fetching`
/// even though the previous data stays readable through
/// [`super::UpdateCoordinator::departures`], and after a failure the
/// status is `Error` while stale-but-valid data likewise remains visible.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateStatus {
    /// No refresh has ever been requested.
    Initial,
    /// A fetch is in flight.
    Fetching { attempt_started_at: DateTime<Utc> },
    /// The last completed refresh produced departures.
    Loaded {
        data: Arc<Vec<StationDepartures>>,
        updated_at: DateTime<Utc>,
    },
    /// The last completed refresh succeeded but found no nearby stations.
    NoResults { updated_at: DateTime<Utc> },
    /// The last completed refresh failed.
    Error,
}

impl UpdateStatus {
    pub fn is_fetching(&self) -> bool {
        matches!(self, UpdateStatus::Fetching { .. })
    }

    /// Completion time of the last successful refresh reflected in this
    /// status, if any.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        match self {
            UpdateStatus::Loaded { updated_at, .. } | UpdateStatus::NoResults { updated_at } => {
                Some(*updated_at)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetching_predicate() {
        let status = UpdateStatus::Fetching {
            attempt_started_at: Utc::now(),
        };
        assert!(status.is_fetching());
        assert!(!UpdateStatus::Initial.is_fetching());
        assert!(!UpdateStatus::Error.is_fetching());
    }

    #[test]
    fn updated_at_only_for_completed_success() {
        let at = Utc::now();
        assert_eq!(UpdateStatus::NoResults { updated_at: at }.updated_at(), Some(at));
        assert_eq!(UpdateStatus::Initial.updated_at(), None);
        assert_eq!(UpdateStatus::Error.updated_at(), None);
    }
}
