//! Address search.
//!
//! Nominatim returns matches best first, with coordinates as decimal
//! strings. Entries whose coordinates do not parse are dropped.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::geo::Coordinate;

use super::Provider;
use super::http::{fetch_json, parse_base};

// ============================================================================
// GeocodeResult
// ============================================================================

/// One address match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    /// Human readable place name.
    pub display_name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl GeocodeResult {
    /// Returns the match position without timezone.
    #[inline]
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

// ============================================================================
// Geocoder
// ============================================================================

/// Forward geocoding: free text to ranked positions.
#[async_trait]
pub trait Geocoder: Provider {
    /// Searches for `query`. An empty list means no match.
    async fn search(&self, query: &str) -> Result<Vec<GeocodeResult>>;
}

// ============================================================================
// Nominatim
// ============================================================================

/// OpenStreetMap Nominatim client.
#[derive(Debug, Clone)]
pub struct Nominatim {
    client: Client,
    url: String,
    limit: Option<u32>,
}

impl Nominatim {
    /// Service name in logs.
    pub const NAME: &'static str = "nominatim";

    /// Default endpoint.
    pub const URL: &'static str = "https://nominatim.openstreetmap.org/search";

    /// Creates a client for the public endpoint.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            url: Self::URL.to_string(),
            limit: None,
        }
    }

    /// Overrides the endpoint.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Caps the number of matches the service returns.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Decodes a Nominatim `format=json` body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] if the body is not an array.
    pub fn parse(body: &Value) -> Result<Vec<GeocodeResult>> {
        let entries = body
            .as_array()
            .ok_or_else(|| Error::provider(Self::NAME, "expected an array of places"))?;

        Ok(entries.iter().filter_map(Self::parse_entry).collect())
    }

    fn parse_entry(entry: &Value) -> Option<GeocodeResult> {
        let number = |key: &str| -> Option<f64> {
            match entry.get(key)? {
                Value::String(text) => text.trim().parse().ok(),
                Value::Number(number) => number.as_f64(),
                _ => None,
            }
        };

        let latitude = number("lat").filter(|v| v.is_finite())?;
        let longitude = number("lon").filter(|v| v.is_finite())?;
        let display_name = entry
            .get("display_name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Some(GeocodeResult {
            display_name,
            latitude,
            longitude,
        })
    }
}

impl Provider for Nominatim {
    fn name(&self) -> &str {
        Self::NAME
    }
}

#[async_trait]
impl Geocoder for Nominatim {
    async fn search(&self, query: &str) -> Result<Vec<GeocodeResult>> {
        let mut url = parse_base(Self::NAME, &self.url)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("format", "json").append_pair("q", query);
            if let Some(limit) = self.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }

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
    fn test_parse_ranked_results() {
        let body = json!([
            { "place_id": 1, "display_name": "Paris, Île-de-France, France", "lat": "48.8588897", "lon": "2.3200410" },
            { "place_id": 2, "display_name": "Paris, Lamar County, Texas", "lat": "33.6617962", "lon": "-95.5555130" }
        ]);

        let results = Nominatim::parse(&body).expect("parse");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].display_name, "Paris, Île-de-France, France");
        assert_eq!(results[0].latitude, 48.8588897);
        assert_eq!(results[1].longitude, -95.555513);
    }

    #[test]
    fn test_unparsable_entries_dropped() {
        let body = json!([
            { "display_name": "Nowhere", "lat": "north", "lon": "2.0" },
            { "display_name": "Somewhere", "lat": 10.0, "lon": 20.0 },
            { "display_name": "Half" , "lat": "1.0" }
        ]);

        let results = Nominatim::parse(&body).expect("parse");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].coordinate(), Coordinate::new(10.0, 20.0));
    }

    #[test]
    fn test_non_array_body_is_error() {
        let err = Nominatim::parse(&json!({ "error": "Unable to geocode" })).expect_err("object");
        assert!(matches!(err, Error::Provider { .. }));
    }

    #[test]
    fn test_empty_result() {
        assert!(Nominatim::parse(&json!([])).expect("parse").is_empty());
    }
}
