//! Departures API HTTP client.

use std::future::Future;

use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::location::Coordinate;
use crate::settings::FilterSelection;

use super::error::FetchError;
use super::types::NearestResponse;

/// Default base URL for the departures backend.
const DEFAULT_BASE_URL: &str = "https://departures-backend.azurewebsites.net/api";

/// Maximum length of a response body echoed back in decode errors.
const ERROR_BODY_LIMIT: usize = 500;

/// Configuration for the departures client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for the API (defaults to production).
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Source of nearest-station departure data.
///
/// The update coordinator is generic over this seam so tests can inject a
/// mock instead of performing HTTP.
pub trait NearestDepartures: Send + Sync + 'static {
    /// Fetch departures for the stations nearest `location`, constrained
    /// by the enabled stop types and modes.
    fn fetch_nearest(
        &self,
        location: Coordinate,
        filters: &FilterSelection,
    ) -> impl Future<Output = Result<NearestResponse, FetchError>> + Send;
}

/// HTTP client for the departures backend.
#[derive(Debug, Clone)]
pub struct DeparturesClient {
    http: reqwest::Client,
    base_url: String,
}

impl DeparturesClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    /// Build the `nearest` request URL. Deterministic in its inputs:
    /// enabled stop-type and mode keys are comma-joined in declaration
    /// order.
    pub fn nearest_url(&self, location: Coordinate, filters: &FilterSelection) -> String {
        let stop_types: Vec<&str> = filters
            .enabled_stop_types()
            .into_iter()
            .map(|t| t.key())
            .collect();
        let modes: Vec<&str> = filters.enabled_modes().into_iter().map(|m| m.key()).collect();

        format!(
            "{}/nearest?lat={}&lng={}&stopTypes={}&modes={}",
            self.base_url,
            location.lat,
            location.lng,
            stop_types.join(","),
            modes.join(",")
        )
    }
}

impl NearestDepartures for DeparturesClient {
    fn fetch_nearest(
        &self,
        location: Coordinate,
        filters: &FilterSelection,
    ) -> impl Future<Output = Result<NearestResponse, FetchError>> + Send {
        let url = self.nearest_url(location, filters);
        let http = self.http.clone();
        async move {
            debug!(%url, "fetching nearest departures");
            let response = http.get(&url).send().await?;

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(FetchError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            if !content_type
                .as_deref()
                .is_some_and(|ct| ct.starts_with("application/json"))
            {
                return Err(FetchError::ContentType(content_type));
            }

            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| FetchError::Json {
                message: e.to_string(),
                body: Some(body.chars().take(ERROR_BODY_LIMIT).collect()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Mode, StopType};

    #[test]
    fn config_builder() {
        let config = ClientConfig::new()
            .with_base_url("http://localhost:8080/api")
            .with_timeout(5);
        assert_eq!(config.base_url, "http://localhost:8080/api");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn nearest_url_with_default_filters() {
        let client = DeparturesClient::new(ClientConfig::new()).unwrap();
        let url = client.nearest_url(
            Coordinate::new(51.5072, -0.1276),
            &FilterSelection::default(),
        );
        assert_eq!(
            url,
            format!(
                "{DEFAULT_BASE_URL}/nearest?lat=51.5072&lng=-0.1276\
                 &stopTypes=NaptanMetroStation,NaptanRailStation\
                 &modes=tube,dlr,overground,elizabeth-line"
            )
        );
    }

    #[test]
    fn nearest_url_omits_disabled_stop_types() {
        let client = DeparturesClient::new(ClientConfig::new()).unwrap();
        let mut filters = FilterSelection::default();
        filters.set_stop_type(StopType::Rail, false);

        let url = client.nearest_url(Coordinate::new(51.5072, -0.1276), &filters);
        assert!(url.contains("stopTypes=NaptanMetroStation&"));
        assert!(!url.contains("NaptanRailStation"));
    }

    #[test]
    fn nearest_url_is_deterministic() {
        let client = DeparturesClient::new(ClientConfig::new()).unwrap();
        let mut filters = FilterSelection::default();
        filters.set_mode(Mode::Tram, true);

        let loc = Coordinate::new(51.5, -0.1);
        assert_eq!(client.nearest_url(loc, &filters), client.nearest_url(loc, &filters));
    }
}
