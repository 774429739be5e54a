//! Shared HTTP plumbing for providers.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::trace;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent sent to every service. Nominatim rejects anonymous clients.
const USER_AGENT: &str = concat!("geoveil/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Client
// ============================================================================

/// Builds the HTTP client shared by all providers.
///
/// # Errors
///
/// Returns [`Error::Http`] if the TLS backend fails to initialize.
pub fn http_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Parses a provider base URL.
///
/// # Errors
///
/// Returns [`Error::Config`] if `base` is not an absolute URL.
pub(crate) fn parse_base(provider: &str, base: &str) -> Result<Url> {
    Url::parse(base).map_err(|e| Error::config(format!("{provider} base URL {base:?}: {e}")))
}

/// GETs a URL and decodes the body as JSON.
///
/// Non-success statuses become [`Error::Provider`].
pub(crate) async fn fetch_json(client: &Client, provider: &str, url: Url) -> Result<Value> {
    trace!(provider, %url, "Fetching");

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::provider(provider, format!("HTTP {status}")));
    }

    Ok(response.json::<Value>().await?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds() {
        assert!(http_client(DEFAULT_TIMEOUT).is_ok());
    }

    #[test]
    fn test_user_agent_names_crate() {
        assert!(USER_AGENT.starts_with("geoveil/"));
    }

    #[test]
    fn test_parse_base_rejects_relative() {
        assert!(parse_base("test", "https://ipwho.is/").is_ok());
        let err = parse_base("test", "ipwho.is").expect_err("relative");
        assert!(matches!(err, Error::Config { .. }));
    }
}
