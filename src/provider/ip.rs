//! IP based positioning.
//!
//! Both services answer with the caller's approximate position and, usually,
//! its IANA timezone. A latitude or longitude of exactly zero is treated as
//! missing.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::geo::Coordinate;

use super::Provider;
use super::http::{fetch_json, parse_base};

// ============================================================================
// IpLocator
// ============================================================================

/// Looks up the position of the current public IP address.
#[async_trait]
pub trait IpLocator: Provider {
    /// Returns the coordinate, with timezone when the service reports one.
    async fn locate(&self) -> Result<Coordinate>;
}

/// Reads a non-zero number field.
fn non_zero(value: &Value, key: &str) -> Option<f64> {
    value
        .get(key)
        .and_then(Value::as_f64)
        .filter(|number| *number != 0.0)
}

// ============================================================================
// IpWhoIs
// ============================================================================

/// `ipwho.is` client.
#[derive(Debug, Clone)]
pub struct IpWhoIs {
    client: Client,
    url: String,
}

impl IpWhoIs {
    /// Service name in logs.
    pub const NAME: &'static str = "ipwho.is";

    /// Default endpoint.
    pub const URL: &'static str = "https://ipwho.is/";

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

    /// Decodes an `ipwho.is` response body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] unless `success` is true and both
    /// components are present and non-zero.
    pub fn parse(body: &Value) -> Result<Coordinate> {
        let succeeded = body.get("success").and_then(Value::as_bool) == Some(true);
        let latitude = non_zero(body, "latitude");
        let longitude = non_zero(body, "longitude");

        match (succeeded, latitude, longitude) {
            (true, Some(latitude), Some(longitude)) => {
                let timezone = body
                    .get("timezone")
                    .and_then(|tz| tz.get("id"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Ok(Coordinate::new(latitude, longitude).with_timezone_opt(timezone))
            }
            _ => {
                let message = body
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("invalid response");
                Err(Error::provider(Self::NAME, message))
            }
        }
    }
}

impl Provider for IpWhoIs {
    fn name(&self) -> &str {
        Self::NAME
    }
}

#[async_trait]
impl IpLocator for IpWhoIs {
    async fn locate(&self) -> Result<Coordinate> {
        let url = parse_base(Self::NAME, &self.url)?;
        let body = fetch_json(&self.client, Self::NAME, url).await?;
        Self::parse(&body)
    }
}

// ============================================================================
// FreeIpApi
// ============================================================================

/// `freeipapi.com` client.
#[derive(Debug, Clone)]
pub struct FreeIpApi {
    client: Client,
    url: String,
}

impl FreeIpApi {
    /// Service name in logs.
    pub const NAME: &'static str = "freeipapi.com";

    /// Default endpoint.
    pub const URL: &'static str = "https://freeipapi.com/api/json";

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

    /// Decodes a `freeipapi.com` response body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] if either component is missing or zero.
    pub fn parse(body: &Value) -> Result<Coordinate> {
        let (Some(latitude), Some(longitude)) =
            (non_zero(body, "latitude"), non_zero(body, "longitude"))
        else {
            return Err(Error::provider(Self::NAME, "missing latitude or longitude"));
        };

        let timezone = body
            .get("timeZone")
            .and_then(Value::as_str)
            .filter(|tz| !tz.is_empty())
            .map(str::to_string);

        Ok(Coordinate::new(latitude, longitude).with_timezone_opt(timezone))
    }
}

impl Provider for FreeIpApi {
    fn name(&self) -> &str {
        Self::NAME
    }
}

#[async_trait]
impl IpLocator for FreeIpApi {
    async fn locate(&self) -> Result<Coordinate> {
        let url = parse_base(Self::NAME, &self.url)?;
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
    fn test_ipwhois_success() {
        let body = json!({
            "ip": "203.0.113.9",
            "success": true,
            "latitude": 48.8566,
            "longitude": 2.3522,
            "timezone": { "id": "Europe/Paris", "utc": "+01:00" }
        });

        let coordinate = IpWhoIs::parse(&body).expect("parse");
        assert_eq!(
            coordinate,
            Coordinate::new(48.8566, 2.3522).with_timezone("Europe/Paris")
        );
    }

    #[test]
    fn test_ipwhois_failure_carries_message() {
        let body = json!({ "success": false, "message": "Reserved range" });
        let err = IpWhoIs::parse(&body).expect_err("failure");
        assert!(err.to_string().contains("Reserved range"));
    }

    #[test]
    fn test_ipwhois_zero_latitude_is_missing() {
        let body = json!({ "success": true, "latitude": 0, "longitude": 2.35 });
        assert!(IpWhoIs::parse(&body).is_err());
    }

    #[test]
    fn test_ipwhois_without_timezone() {
        let body = json!({ "success": true, "latitude": 10.5, "longitude": -66.9 });
        let coordinate = IpWhoIs::parse(&body).expect("parse");
        assert!(coordinate.timezone_id.is_none());
    }

    #[test]
    fn test_freeipapi_success() {
        let body = json!({
            "ipAddress": "203.0.113.9",
            "latitude": 35.6895,
            "longitude": 139.6917,
            "timeZone": "Asia/Tokyo"
        });

        let coordinate = FreeIpApi::parse(&body).expect("parse");
        assert_eq!(coordinate.timezone_id.as_deref(), Some("Asia/Tokyo"));
        assert_eq!(coordinate.latitude, 35.6895);
    }

    #[test]
    fn test_freeipapi_missing_fields() {
        assert!(FreeIpApi::parse(&json!({ "latitude": 35.6 })).is_err());
        assert!(FreeIpApi::parse(&json!("rate limited")).is_err());
    }

    #[test]
    fn test_names() {
        let client = Client::new();
        assert_eq!(IpWhoIs::new(client.clone()).name(), "ipwho.is");
        assert_eq!(FreeIpApi::new(client).name(), "freeipapi.com");
    }
}
