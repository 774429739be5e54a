//! Persistent key/value storage.
//!
//! The coordinator persists its state and the control panel persists saved
//! locations through [`KeyValueStore`]. Values are JSON documents.
//!
//! # Implementations
//!
//! | Type | Backing |
//! |------|---------|
//! | [`MemoryStore`] | In-process map |
//! | [`FileStore`] | Single JSON file, atomic replace |
//! | [`RemoteHost`](crate::host::RemoteHost) | Browser extension storage via the bridge |
//!
//! # Keys
//!
//! | Key | Value |
//! |-----|-------|
//! | [`keys::SPOOFING`] | `bool` |
//! | [`keys::IP_SYNC`] | `bool` |
//! | [`keys::COORDINATE`] | [`Coordinate`](crate::geo::Coordinate) |
//! | [`keys::SAVED_LOCATIONS`] | array of [`SavedLocation`](crate::geo::SavedLocation) |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// JSON file backed store.
pub mod file;

/// In-memory store.
pub mod memory;

// ============================================================================
// Re-exports
// ============================================================================

pub use file::FileStore;
pub use memory::MemoryStore;

// ============================================================================
// Keys
// ============================================================================

/// Storage keys shared by coordinator and control panel.
pub mod keys {
    /// Spoofing enabled flag.
    pub const SPOOFING: &str = "active";

    /// IP sync enabled flag.
    pub const IP_SYNC: &str = "ipSync";

    /// Current coordinate and timezone.
    pub const COORDINATE: &str = "coords";

    /// Saved locations collection.
    pub const SAVED_LOCATIONS: &str = "savedLocations";
}

// ============================================================================
// KeyValueStore
// ============================================================================

/// Asynchronous JSON key/value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value. Returns `None` if the key was never written.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Writes a value, replacing any previous one.
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

// ============================================================================
// Typed Helpers
// ============================================================================

/// Reads and decodes a typed value.
///
/// # Errors
///
/// Returns [`Error::Json`](crate::Error::Json) if the stored value does not
/// decode as `T`.
pub async fn load<T>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(Value::Null) | None => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

/// Encodes and writes a typed value.
pub async fn save<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    store.set(key, serde_json::to_value(value)?).await
}

// ============================================================================
// Tests
// ============================================================================
