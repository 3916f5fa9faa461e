//! Error types for the catalog provider.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while talking to the catalog service or the fetcher.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an unexpected status.
    #[error("catalog request to {url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The service kept throttling after all allowed waits.
    #[error("catalog request to {url} still throttled after {attempts} attempts")]
    Throttled {
        url: String,
        attempts: u32,
        retry_after: Option<Duration>,
    },

    /// A response body did not have the expected shape.
    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// The endpoint URL could not be built.
    #[error("invalid catalog endpoint '{endpoint}': {reason}")]
    Endpoint { endpoint: String, reason: String },

    /// The HTTP client could not be constructed.
    #[error("HTTP client construction failed: {0}")]
    ClientBuild(String),

    /// The external fetch command could not be started.
    #[error("failed to run fetch command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProviderError {
    #[must_use]
    pub fn decode(url: &str, reason: impl Into<String>) -> Self {
        Self::Decode {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn endpoint(endpoint: &str, reason: impl Into<String>) -> Self {
        Self::Endpoint {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }
}
