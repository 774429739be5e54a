//! Geographic coordinate with optional timezone.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Coordinates closer than this to (0, 0) are treated as uninitialized.
pub const NULL_ISLAND_EPSILON: f64 = 0.0001;

// ============================================================================
// Coordinate
// ============================================================================

/// A latitude/longitude pair plus the IANA timezone used with it.
///
/// # Format
///
/// ```json
/// { "lat": 48.8566, "long": 2.3522, "timezoneId": "Europe/Paris" }
/// ```
///
/// Latitude and longitude also decode from numeric strings. A string that
/// is not a number decodes to NaN, which the override path rejects as
/// corrupted data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    #[serde(rename = "lat", alias = "latitude", deserialize_with = "lenient_f64")]
    pub latitude: f64,

    /// Longitude in degrees.
    #[serde(rename = "long", alias = "longitude", deserialize_with = "lenient_f64")]
    pub longitude: f64,

    /// IANA timezone identifier, e.g. `Europe/Paris`.
    #[serde(
        rename = "timezoneId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub timezone_id: Option<String>,
}

impl Coordinate {
    /// San Francisco, used until the user picks a location.
    pub const DEFAULT: Self = Self {
        latitude: 37.7749,
        longitude: -122.4194,
        timezone_id: None,
    };

    /// Creates a coordinate without timezone.
    #[inline]
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            timezone_id: None,
        }
    }

    /// Attaches a timezone identifier.
    #[inline]
    #[must_use]
    pub fn with_timezone(mut self, timezone_id: impl Into<String>) -> Self {
        self.timezone_id = Some(timezone_id.into());
        self
    }

    /// Replaces the timezone identifier.
    #[inline]
    #[must_use]
    pub fn with_timezone_opt(mut self, timezone_id: Option<String>) -> Self {
        self.timezone_id = timezone_id;
        self
    }

    /// Drops the timezone identifier.
    #[inline]
    #[must_use]
    pub fn without_timezone(mut self) -> Self {
        self.timezone_id = None;
        self
    }

    /// Returns `true` if both components are finite numbers.
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Returns `true` if the coordinate is within `epsilon` of (0, 0).
    #[inline]
    #[must_use]
    pub fn is_null_island(&self, epsilon: f64) -> bool {
        self.latitude.abs() < epsilon && self.longitude.abs() < epsilon
    }

    /// Returns `true` if the coordinate can be applied as an override.
    #[inline]
    #[must_use]
    pub fn is_applicable(&self) -> bool {
        self.is_finite() && !self.is_null_island(NULL_ISLAND_EPSILON)
    }

    /// Checks that latitude and longitude are finite and in range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCoordinate`] describing the first bad component.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::invalid_coordinate(format!(
                "latitude {} outside [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::invalid_coordinate(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

impl Default for Coordinate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)?;
        if let Some(tz) = &self.timezone_id {
            write!(f, " ({tz})")?;
        }
        Ok(())
    }
}

// ============================================================================
// Lenient Decoding
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawNumber::Number(value)) => value,
        Some(RawNumber::Text(text)) => text.trim().parse().unwrap_or(f64::NAN),
        None => f64::NAN,
    })
}

// ============================================================================
// Tests
// ============================================================================
