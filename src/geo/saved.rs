//! Named locations saved by the user.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::LocationId;
use crate::store::{self, KeyValueStore, keys};

use super::Coordinate;

// ============================================================================
// SavedLocation
// ============================================================================

/// A named coordinate. Never edited in place; delete and save again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLocation {
    /// Unique, creation-ordered ID.
    pub id: LocationId,
    /// User supplied display name.
    pub name: String,
    /// Saved coordinate, including timezone if known.
    pub coordinate: Coordinate,
}

// ============================================================================
// SavedLocations
// ============================================================================

/// Insertion-ordered collection of saved locations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedLocations {
    entries: Vec<SavedLocation>,
}

impl SavedLocations {
    /// Creates an empty collection.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a location at the end and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLocationName`] if `name` is blank.
    pub fn add(&mut self, name: &str, coordinate: Coordinate) -> Result<SavedLocation> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_location_name(name));
        }

        let location = SavedLocation {
            id: LocationId::generate(),
            name: name.to_string(),
            coordinate,
        };
        self.entries.push(location.clone());
        Ok(location)
    }

    /// Removes a location, keeping the order of the rest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LocationNotFound`] if no entry has `id`.
    pub fn remove(&mut self, id: LocationId) -> Result<SavedLocation> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| Error::location_not_found(id))?;
        Ok(self.entries.remove(index))
    }

    /// Looks up a location by ID.
    #[must_use]
    pub fn get(&self, id: LocationId) -> Option<&SavedLocation> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SavedLocation> {
        self.entries.iter()
    }

    /// Returns the entries as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[SavedLocation] {
        &self.entries
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is saved.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// SavedLocations - Persistence
// ============================================================================

impl SavedLocations {
    /// Loads the collection from a store. Missing key yields an empty list.
    pub async fn load(store: &dyn KeyValueStore) -> Result<Self> {
        let locations = store::load::<Self>(store, keys::SAVED_LOCATIONS)
            .await?
            .unwrap_or_default();
        debug!(count = locations.len(), "Saved locations loaded");
        Ok(locations)
    }

    /// Writes the collection to a store.
    pub async fn persist(&self, store: &dyn KeyValueStore) -> Result<()> {
        store::save(store, keys::SAVED_LOCATIONS, self).await
    }
}

impl<'a> IntoIterator for &'a SavedLocations {
    type Item = &'a SavedLocation;
    type IntoIter = std::slice::Iter<'a, SavedLocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::store::MemoryStore;

    fn names(locations: &SavedLocations) -> Vec<&str> {
        locations.iter().map(|l| l.name.as_str()).collect()
    }

    #[test]
    fn test_save_list_delete() {
        let mut locations = SavedLocations::new();
        let paris = Coordinate::new(48.8566, 2.3522).with_timezone("Europe/Paris");

        let saved = locations.add("Paris", paris.clone()).expect("add");
        assert!(
            locations
                .iter()
                .any(|l| l.name == "Paris" && l.coordinate == paris)
        );

        locations.remove(saved.id).expect("remove");
        assert!(locations.get(saved.id).is_none());
        assert!(locations.is_empty());
    }

    #[test]
    fn test_order_preserved_after_delete() {
        let mut locations = SavedLocations::new();
        locations.add("A", Coordinate::new(1.0, 1.0)).expect("add");
        let b = locations.add("B", Coordinate::new(2.0, 2.0)).expect("add");
        locations.add("C", Coordinate::new(3.0, 3.0)).expect("add");
        locations.add("D", Coordinate::new(4.0, 4.0)).expect("add");

        locations.remove(b.id).expect("remove");
        assert_eq!(names(&locations), ["A", "C", "D"]);
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut locations = SavedLocations::new();
        let err = locations
            .add("   ", Coordinate::new(1.0, 1.0))
            .expect_err("blank name");
        assert!(matches!(err, Error::InvalidLocationName { .. }));
        assert!(locations.is_empty());
    }

    #[test]
    fn test_name_is_trimmed() {
        let mut locations = SavedLocations::new();
        let saved = locations
            .add("  Home ", Coordinate::new(1.0, 1.0))
            .expect("add");
        assert_eq!(saved.name, "Home");
    }

    #[test]
    fn test_remove_unknown() {
        let mut locations = SavedLocations::new();
        let err = locations
            .remove(LocationId::generate())
            .expect_err("unknown id");
        assert!(matches!(err, Error::LocationNotFound { .. }));
    }

    #[tokio::test]
    async fn test_persist_and_load() {
        let store = MemoryStore::new();
        let mut locations = SavedLocations::new();
        locations.add("Tokyo", Coordinate::new(35.68, 139.69)).expect("add");
        locations.add("Lima", Coordinate::new(-12.04, -77.04)).expect("add");

        locations.persist(&store).await.expect("persist");
        let loaded = SavedLocations::load(&store).await.expect("load");

        assert_eq!(loaded, locations);
        assert_eq!(names(&loaded), ["Tokyo", "Lima"]);
    }
}
