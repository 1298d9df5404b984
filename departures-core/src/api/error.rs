//! Fetch error taxonomy.

/// Errors from the departures HTTP client.
///
/// All failure kinds surface through this one enum; a failed fetch never
/// produces partial data. Display messages collapse for the UI, but the
/// variants stay distinguishable for logs.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport failure: connection refused, DNS, timeout.
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("server error {status}: {message}")]
    Api { status: u16, message: String },

    /// The server answered 2xx but not with JSON.
    #[error("unexpected content type: {0:?}")]
    ContentType(Option<String>),

    /// The body was not valid JSON for the expected schema.
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        /// Truncated response body, for diagnostics.
        body: Option<String>,
    },
}

impl FetchError {
    /// Short stable label for telemetry.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Http(_) => "network",
            FetchError::Api { .. } => "server",
            FetchError::ContentType(_) => "content-type",
            FetchError::Json { .. } => "decode",
        }
    }
}
