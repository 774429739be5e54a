//! Timezone lookup by coordinate.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};
use crate::geo::Coordinate;

use super::Provider;
use super::http::{fetch_json, parse_base};

// ============================================================================
// TimezoneLookup
// ============================================================================

/// Resolves the IANA timezone at a coordinate.
#[async_trait]
pub trait TimezoneLookup: Provider {
    /// Returns a timezone identifier such as `Europe/Paris`.
    async fn timezone(&self, coordinate: &Coordinate) -> Result<String>;
}

/// Builds `base?latitude=..&longitude=..`.
fn coordinate_url(provider: &str, base: &str, coordinate: &Coordinate) -> Result<Url> {
    let mut url = parse_base(provider, base)?;
    url.query_pairs_mut()
        .append_pair("latitude", &coordinate.latitude.to_string())
        .append_pair("longitude", &coordinate.longitude.to_string());
    Ok(url)
}

/// Reads a non-empty string field.
fn timezone_field(provider: &str, body: &Value, key: &str) -> Result<String> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|tz| !tz.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::provider(provider, format!("response has no {key}")))
}

// ============================================================================
// TimeApiIo
// ============================================================================

/// `timeapi.io` client.
#[derive(Debug, Clone)]
pub struct TimeApiIo {
    client: Client,
    url: String,
}

impl TimeApiIo {
    /// Service name in logs.
    pub const NAME: &'static str = "timeapi.io";

    /// Default endpoint.
    pub const URL: &'static str = "https://timeapi.io/api/TimeZone/coordinate";

    /// Creates a client for the public endpoint.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            url: Self::URL.to_string(),
        }
    }

    /// Overrides the endpoint.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Extracts `timeZone` from a response body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] if the field is missing or empty.
    pub fn parse(body: &Value) -> Result<String> {
        timezone_field(Self::NAME, body, "timeZone")
    }
}

impl Provider for TimeApiIo {
    fn name(&self) -> &str {
        Self::NAME
    }
}

#[async_trait]
impl TimezoneLookup for TimeApiIo {
    async fn timezone(&self, coordinate: &Coordinate) -> Result<String> {
        let url = coordinate_url(Self::NAME, &self.url, coordinate)?;
        let body = fetch_json(&self.client, Self::NAME, url).await?;
        Self::parse(&body)
    }
}

// ============================================================================
// WhereTheIss
// ============================================================================

/// `api.wheretheiss.at` client.
#[derive(Debug, Clone)]
pub struct WhereTheIss {
    client: Client,
    url: String,
}

impl WhereTheIss {
    /// Service name in logs.
    pub const NAME: &'static str = "wheretheiss.at";

    /// Default endpoint.
    pub const URL: &'static str = "https://api.wheretheiss.at/v1/coordinates";

    /// Creates a client for the public endpoint.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            url: Self::URL.to_string(),
        }
    }

    /// Overrides the endpoint.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Extracts `timezone_id` from a response body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] if the field is missing or empty.
    pub fn parse(body: &Value) -> Result<String> {
        timezone_field(Self::NAME, body, "timezone_id")
    }
}

impl Provider for WhereTheIss {
    fn name(&self) -> &str {
        Self::NAME
    }
}

#[async_trait]
impl TimezoneLookup for WhereTheIss {
    async fn timezone(&self, coordinate: &Coordinate) -> Result<String> {
        let url = coordinate_url(Self::NAME, &self.url, coordinate)?;
        let body = fetch_json(&self.client, Self::NAME, url).await?;
        Self::parse(&body)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_coordinate_url() {
        let url = coordinate_url(
            TimeApiIo::NAME,
            TimeApiIo::URL,
            &Coordinate::new(48.8566, 2.3522),
        )
        .expect("url");

        assert_eq!(
            url.as_str(),
            "https://timeapi.io/api/TimeZone/coordinate?latitude=48.8566&longitude=2.3522"
        );
    }

    #[test]
    fn test_negative_components_in_url() {
        let url = coordinate_url(
            WhereTheIss::NAME,
            WhereTheIss::URL,
            &Coordinate::new(-33.8688, -151.2093),
        )
        .expect("url");

        assert_eq!(url.query(), Some("latitude=-33.8688&longitude=-151.2093"));
    }

    #[test]
    fn test_timeapi_parse() {
        let body = json!({ "timeZone": "Europe/Paris", "currentLocalTime": "2024-01-01T12:00:00" });
        assert_eq!(TimeApiIo::parse(&body).expect("parse"), "Europe/Paris");
        assert!(TimeApiIo::parse(&json!({ "timeZone": "" })).is_err());
    }

    #[test]
    fn test_wheretheiss_parse() {
        let body = json!({ "latitude": "35.6", "timezone_id": "Asia/Tokyo", "offset": 9 });
        assert_eq!(WhereTheIss::parse(&body).expect("parse"), "Asia/Tokyo");
        assert!(WhereTheIss::parse(&json!({ "error": "invalid" })).is_err());
    }
}
