//! Applying the position and timezone override to one session.
//!
//! | Step | Condition | Result |
//! |------|-----------|--------|
//! | 1 | no coordinate | `Skipped(NoCoordinate)` |
//! | 2 | latitude or longitude not finite | `Skipped(InvalidCoordinate)` |
//! | 3 | within epsilon of (0, 0) | `Skipped(NullIsland)` |
//! | 4 | otherwise | `Emulation.setGeolocationOverride` |
//! | 5 | timezone present | `Emulation.setTimezoneOverride` |
//!
//! Steps 4 and 5 are independent: a failed geolocation override does not
//! stop the timezone override.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::geo::Coordinate;
use crate::host::{DebugTarget, Instrumentation};
use crate::protocol::DevToolsCommand;

// ============================================================================
// SkipReason
// ============================================================================

/// Why no override was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The coordinator has no coordinate.
    NoCoordinate,
    /// Latitude or longitude is NaN or infinite.
    InvalidCoordinate,
    /// The coordinate is the uninitialized (0, 0) sentinel.
    NullIsland,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCoordinate => f.write_str("no coordinate"),
            Self::InvalidCoordinate => f.write_str("invalid coordinate"),
            Self::NullIsland => f.write_str("null island"),
        }
    }
}

// ============================================================================
// OverrideOutcome
// ============================================================================

/// Result of one override attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideOutcome {
    /// Geolocation override accepted by the host.
    Applied {
        /// A timezone override was also accepted.
        timezone: bool,
    },
    /// The host refused the geolocation override.
    Rejected {
        /// Host error message.
        message: String,
    },
    /// Nothing was sent.
    Skipped(SkipReason),
}

impl OverrideOutcome {
    /// Returns `true` if the geolocation override is in place.
    #[inline]
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Checks whether a coordinate may be sent to the host.
///
/// # Errors
///
/// Returns the [`SkipReason`] for coordinates that must not be applied.
pub fn check_coordinate(
    coordinate: Option<&Coordinate>,
    epsilon: f64,
) -> Result<&Coordinate, SkipReason> {
    let coordinate = coordinate.ok_or(SkipReason::NoCoordinate)?;

    if !coordinate.is_finite() {
        return Err(SkipReason::InvalidCoordinate);
    }

    if coordinate.is_null_island(epsilon) {
        return Err(SkipReason::NullIsland);
    }

    Ok(coordinate)
}

// ============================================================================
// Override
// ============================================================================

/// Sends the position override, then the timezone override if any.
pub(crate) async fn apply_override(
    instrumentation: &dyn Instrumentation,
    target: &DebugTarget,
    coordinate: Option<&Coordinate>,
    accuracy: f64,
    epsilon: f64,
) -> OverrideOutcome {
    let coordinate = match check_coordinate(coordinate, epsilon) {
        Ok(coordinate) => coordinate,
        Err(reason) => {
            match reason {
                SkipReason::NoCoordinate => warn!(%target, "No coordinate available to set"),
                SkipReason::InvalidCoordinate => {
                    error!(%target, coordinate = ?coordinate, "Invalid coordinate, not applying");
                }
                SkipReason::NullIsland => warn!(%target, "Skipping null island coordinate"),
            }
            return OverrideOutcome::Skipped(reason);
        }
    };

    debug!(
        %target,
        latitude = coordinate.latitude,
        longitude = coordinate.longitude,
        accuracy,
        "Setting geolocation override"
    );

    let geolocation = instrumentation
        .send_command(
            target,
            DevToolsCommand::set_geolocation(coordinate.latitude, coordinate.longitude, accuracy),
        )
        .await;

    match &geolocation {
        Ok(_) => info!(%target, %coordinate, "Geolocation override applied"),
        Err(e) => error!(%target, error = %e, "Geolocation override failed"),
    }

    let timezone = match coordinate.timezone_id.as_deref().filter(|tz| !tz.is_empty()) {
        Some(timezone_id) => {
            match instrumentation
                .send_command(target, DevToolsCommand::set_timezone(timezone_id))
                .await
            {
                Ok(_) => {
                    debug!(%target, timezone_id, "Timezone override applied");
                    true
                }
                Err(e) => {
                    warn!(%target, timezone_id, error = %e, "Timezone override failed");
                    false
                }
            }
        }
        None => false,
    };

    match geolocation {
        Ok(_) => OverrideOutcome::Applied { timezone },
        Err(e) => OverrideOutcome::Rejected {
            message: e.to_string(),
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
