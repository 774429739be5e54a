//! Location data model.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Coordinate`] | Latitude, longitude and optional timezone |
//! | [`SavedLocation`] | Named coordinate saved by the user |
//! | [`SavedLocations`] | Insertion-ordered saved location list |

// ============================================================================
// Submodules
// ============================================================================

/// Coordinate type and null-island handling.
pub mod coordinate;

/// Saved locations.
pub mod saved;

// ============================================================================
// Re-exports
// ============================================================================

pub use coordinate::{Coordinate, NULL_ISLAND_EPSILON};
pub use saved::{SavedLocation, SavedLocations};
