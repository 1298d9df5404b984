//! Mock departures client for testing without network access.
//!
//! Serves a canned [`NearestResponse`] (in-memory or loaded from a JSON
//! file), counts calls, and can simulate latency and server failures.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;

use crate::location::Coordinate;
use crate::settings::FilterSelection;

use super::client::NearestDepartures;
use super::error::FetchError;
use super::types::NearestResponse;

/// Mock client serving a fixed response.
#[derive(Clone)]
pub struct MockNearestClient {
    response: Arc<RwLock<NearestResponse>>,
    calls: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
    delay: Duration,
}

impl MockNearestClient {
    /// Create a mock that always serves `response`.
    pub fn with_response(response: NearestResponse) -> Self {
        Self {
            response: Arc::new(RwLock::new(response)),
            calls: Arc::new(AtomicUsize::new(0)),
            fail: Arc::new(AtomicBool::new(false)),
            delay: Duration::ZERO,
        }
    }

    /// Create a mock from a JSON file holding a `NearestResponse`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FetchError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| FetchError::Api {
            status: 0,
            message: format!("failed to read mock data {}: {e}", path.display()),
        })?;
        let response: NearestResponse =
            serde_json::from_str(&raw).map_err(|e| FetchError::Json {
                message: e.to_string(),
                body: Some(raw.chars().take(500).collect()),
            })?;
        Ok(Self::with_response(response))
    }

    /// Add per-call latency, to hold fetches open in concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of fetches performed so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make subsequent fetches fail with a 503 until cleared.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Replace the served response.
    pub async fn set_response(&self, response: NearestResponse) {
        *self.response.write().await = response;
    }
}

impl NearestDepartures for MockNearestClient {
    fn fetch_nearest(
        &self,
        _location: Coordinate,
        _filters: &FilterSelection,
    ) -> impl Future<Output = Result<NearestResponse, FetchError>> + Send {
        let this = self.clone();
        async move {
            this.calls.fetch_add(1, Ordering::SeqCst);
            if !this.delay.is_zero() {
                tokio::time::sleep(this.delay).await;
            }
            if this.fail.load(Ordering::SeqCst) {
                return Err(FetchError::Api {
                    status: 503,
                    message: "mock failure".to_string(),
                });
            }
            Ok(this.response.read().await.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_response() -> NearestResponse {
        NearestResponse {
            stns_deps: vec![],
            lat: 51.5,
            lng: -0.1,
        }
    }

    #[tokio::test]
    async fn serves_response_and_counts_calls() {
        let mock = MockNearestClient::with_response(empty_response());
        assert_eq!(mock.call_count(), 0);

        let result = mock
            .fetch_nearest(Coordinate::new(51.5, -0.1), &FilterSelection::default())
            .await
            .unwrap();
        assert!(result.stns_deps.is_empty());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn injected_failure_surfaces_as_server_error() {
        let mock = MockNearestClient::with_response(empty_response());
        mock.set_fail(true);

        let err = mock
            .fetch_nearest(Coordinate::new(51.5, -0.1), &FilterSelection::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "server");
    }

    #[tokio::test]
    async fn loads_response_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nearest.json");
        std::fs::write(&path, r#"{"stnsDeps": [], "lat": 51.5, "lng": -0.1}"#).unwrap();

        let mock = MockNearestClient::from_file(&path).unwrap();
        let result = mock
            .fetch_nearest(Coordinate::new(51.5, -0.1), &FilterSelection::default())
            .await
            .unwrap();
        assert_eq!(result.lat, 51.5);
    }

    #[test]
    fn rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nearest.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(MockNearestClient::from_file(&path).is_err());
    }
}
