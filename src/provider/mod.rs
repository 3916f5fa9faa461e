//! Catalog provider backed by the public Web API.
//!
//! Metadata comes from JSON endpoints over [`reqwest`]; audio retrieval is
//! delegated to an external [`CommandFetcher`]. Missing entities (HTTP 400
//! or 404) surface as `Ok(None)` / empty listings so the engine can report
//! "not found" instead of failing. Throttling (HTTP 429) is retried a few
//! times, honouring `Retry-After`.

mod error;
mod fetch;
mod http_client;
mod web_api;

pub use error::ProviderError;
pub use fetch::{CommandFetcher, DEFAULT_FETCH_PROGRAM};
pub use http_client::{MAX_RETRY_AFTER, build_http_client, parse_retry_after, user_agent};
pub use web_api::{DEFAULT_API_BASE_URL, WebApiProvider};
