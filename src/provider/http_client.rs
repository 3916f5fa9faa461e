//! HTTP client construction and throttling helpers for the catalog API.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use tracing::{debug, instrument, warn};

use super::ProviderError;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 30;

/// Longest server-requested wait honoured before giving up.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(120);

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/zspot";

/// User-Agent sent with every catalog request.
#[must_use]
pub fn user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("zspot/{version} (+{PROJECT_UA_URL})")
}

/// Builds the catalog HTTP client with project timeouts and user agent.
///
/// # Errors
///
/// Returns [`ProviderError::ClientBuild`] when client construction fails.
pub fn build_http_client() -> Result<Client, ProviderError> {
    match try_build_client(false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed environments panic when querying system proxy
            // settings; fall back to env proxies only.
            warn!("HTTP client hit system proxy panic; using env-proxy fallback builder");
            match try_build_client(true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(ProviderError::ClientBuild(
                    "client construction panicked".to_string(),
                )),
                Err(BuildClientFailure::Build(error)) => {
                    Err(ProviderError::ClientBuild(error.to_string()))
                }
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(ProviderError::ClientBuild(error.to_string())),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(disable_system_proxy_lookup: bool) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder();
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder() -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
        .user_agent(user_agent())
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    let https = ["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"];
    if let Some(proxy) = first_env_value(&https)
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    let http = ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"];
    if let Some(proxy) = first_env_value(&http)
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn first_env_value(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

/// Parses a Retry-After header value into a Duration.
///
/// Supports integer seconds and RFC 7231 HTTP-dates. Returns `None` for
/// unparseable or negative values; caps values at [`MAX_RETRY_AFTER`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use zspot_core::provider::parse_retry_after;
///
/// assert_eq!(parse_retry_after("3"), Some(Duration::from_secs(3)));
/// assert_eq!(parse_retry_after("soon"), None);
/// ```
#[must_use]
#[instrument]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<i64>() {
        if seconds < 0 {
            debug!(seconds, "negative Retry-After value, ignoring");
            return None;
        }
        #[allow(clippy::cast_sign_loss)]
        let duration = Duration::from_secs(seconds as u64);
        return Some(duration.min(MAX_RETRY_AFTER));
    }

    let Ok(datetime) = httpdate::parse_http_date(header_value) else {
        debug!(header_value, "unparseable Retry-After value");
        return None;
    };
    let duration = datetime
        .duration_since(std::time::SystemTime::now())
        .unwrap_or(Duration::ZERO);
    Some(duration.min(MAX_RETRY_AFTER))
}
