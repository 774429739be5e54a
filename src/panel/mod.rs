//! Control panel model.
//!
//! The panel is the user-facing side: it keeps the selected point, mirrors
//! the coordinator's flags, searches addresses and manages saved locations.
//! It talks to the coordinator only through [`CoordinatorClient`], so the
//! same model works in-process or across the bridge.
//!
//! | Action | Messages sent |
//! |--------|---------------|
//! | [`ControlPanel::load_state`] | `GET_STATUS` |
//! | [`ControlPanel::select_point`] | `TOGGLE_IP_SYNC(false)` if syncing, then `SET_LOCATION` |
//! | [`ControlPanel::toggle_spoofing`] | `TOGGLE_SPOOFING` |
//! | [`ControlPanel::set_ip_sync`] | `TOGGLE_IP_SYNC` |
//!
//! # Example
//!
//! ```ignore
//! let mut panel = ControlPanel::new(coordinator.clone(), store)
//!     .with_geocoder(Arc::new(Nominatim::new(http_client(DEFAULT_TIMEOUT)?)));
//!
//! panel.load_state().await?;
//! let results = panel.search("Eiffel Tower").await?;
//! panel.choose_search_result(&results[0]).await?;
//! panel.save_location("Paris").await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::coordinator::Coordinator;
use crate::error::{Error, Result};
use crate::geo::{Coordinate, SavedLocation, SavedLocations};
use crate::identifiers::LocationId;
use crate::protocol::{ControlMessage, ControlReply};
use crate::provider::{GeocodeResult, Geocoder};
use crate::store::KeyValueStore;

// ============================================================================
// Submodules
// ============================================================================

/// Display model.
pub mod view;

// ============================================================================
// Re-exports
// ============================================================================

pub use view::PanelView;

// ============================================================================
// CoordinatorClient
// ============================================================================

/// Channel from the panel to the coordinator.
#[async_trait]
pub trait CoordinatorClient: Send + Sync {
    /// Sends one message and waits for the reply.
    async fn request(&self, message: ControlMessage) -> ControlReply;
}

#[async_trait]
impl CoordinatorClient for Coordinator {
    async fn request(&self, message: ControlMessage) -> ControlReply {
        self.handle_message(message).await
    }
}

#[async_trait]
impl<C: CoordinatorClient + ?Sized> CoordinatorClient for Arc<C> {
    async fn request(&self, message: ControlMessage) -> ControlReply {
        self.as_ref().request(message).await
    }
}

// ============================================================================
// ControlPanel
// ============================================================================

/// One open control panel.
pub struct ControlPanel<C> {
    client: C,
    store: Arc<dyn KeyValueStore>,
    geocoder: Option<Arc<dyn Geocoder>>,
    selection: Coordinate,
    spoofing: bool,
    ip_sync: bool,
    saved: SavedLocations,
}

impl<C> fmt::Debug for ControlPanel<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlPanel")
            .field("selection", &self.selection)
            .field("spoofing", &self.spoofing)
            .field("ip_sync", &self.ip_sync)
            .field("saved", &self.saved.len())
            .field("geocoder", &self.geocoder.as_ref().map(|g| g.name().to_string()))
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ControlPanel - Construction
// ============================================================================

impl<C: CoordinatorClient> ControlPanel<C> {
    /// Creates a panel with the default selection and no geocoder.
    ///
    /// `store` holds the saved locations.
    #[must_use]
    pub fn new(client: C, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            client,
            store,
            geocoder: None,
            selection: Coordinate::DEFAULT,
            spoofing: false,
            ip_sync: false,
            saved: SavedLocations::new(),
        }
    }

    /// Sets the address search provider.
    #[must_use]
    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }
}

// ============================================================================
// ControlPanel - Accessors
// ============================================================================

impl<C> ControlPanel<C> {
    /// Returns the selected point.
    #[inline]
    #[must_use]
    pub fn selection(&self) -> &Coordinate {
        &self.selection
    }

    /// Returns `true` if the panel shows spoofing as enabled.
    #[inline]
    #[must_use]
    pub fn is_spoofing(&self) -> bool {
        self.spoofing
    }

    /// Returns `true` if the panel shows IP sync as enabled.
    #[inline]
    #[must_use]
    pub fn is_ip_syncing(&self) -> bool {
        self.ip_sync
    }

    /// Returns the saved locations.
    #[inline]
    #[must_use]
    pub fn saved_locations(&self) -> &SavedLocations {
        &self.saved
    }

    /// Returns the display model.
    #[must_use]
    pub fn view(&self) -> PanelView {
        PanelView::new(&self.selection, self.spoofing, self.ip_sync)
    }
}

// ============================================================================
// ControlPanel - Coordinator State
// ============================================================================

impl<C: CoordinatorClient> ControlPanel<C> {
    /// Pulls the coordinator state and the saved locations.
    ///
    /// A coordinate with latitude exactly 0 is treated as unset and the
    /// selection is kept.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] if the coordinator answers with anything but a status
    /// - store errors while loading saved locations
    pub async fn load_state(&mut self) -> Result<()> {
        let reply = self.client.request(ControlMessage::GetStatus).await;
        let ControlReply::Status(status) = reply else {
            return Err(Error::protocol(format!(
                "Expected status reply, got {reply:?}"
            )));
        };

        self.spoofing = status.active;
        self.ip_sync = status.ip_sync;
        if let Some(coordinate) = status.coordinate
            && coordinate.latitude != 0.0
        {
            self.selection = coordinate;
        }

        self.saved = SavedLocations::load(self.store.as_ref()).await?;

        debug!(
            spoofing = self.spoofing,
            ip_sync = self.ip_sync,
            selection = %self.selection,
            "Panel state loaded"
        );
        Ok(())
    }

    /// Selects a point, as a map click does.
    ///
    /// Turns IP sync off first, since a manual pick overrides it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCoordinate`] if the point is out of range.
    /// Nothing is sent in that case.
    pub async fn select_point(&mut self, latitude: f64, longitude: f64) -> Result<()> {
        let selection = Coordinate::new(latitude, longitude);
        selection.validate()?;
        self.selection = selection;

        if self.ip_sync {
            self.ip_sync = false;
            self.client
                .request(ControlMessage::ToggleIpSync { active: false })
                .await;
        }

        let reply = self
            .client
            .request(ControlMessage::SetLocation(self.selection.clone()))
            .await;
        debug!(selection = %self.selection, ?reply, "Point selected");
        Ok(())
    }

    /// Flips spoofing and returns the state the coordinator reports.
    pub async fn toggle_spoofing(&mut self) -> bool {
        let requested = !self.spoofing;
        self.spoofing = requested;

        match self
            .client
            .request(ControlMessage::ToggleSpoofing { active: requested })
            .await
        {
            ControlReply::Spoofing { active } => self.spoofing = active,
            other => warn!(?other, "Unexpected reply to spoofing toggle"),
        }

        info!(active = self.spoofing, "Spoofing toggled from panel");
        self.spoofing
    }

    /// Turns IP sync on or off.
    ///
    /// A `synced` reply replaces the selection with the IP position.
    pub async fn set_ip_sync(&mut self, active: bool) -> ControlReply {
        self.ip_sync = active;

        let reply = self
            .client
            .request(ControlMessage::ToggleIpSync { active })
            .await;

        match &reply {
            ControlReply::Synced { coordinate } => {
                self.selection = coordinate.clone();
                info!(selection = %self.selection, "Selection synced from IP address");
            }
            ControlReply::SyncFailed => warn!("IP sync failed, keeping selection"),
            _ => {}
        }

        reply
    }
}

// ============================================================================
// ControlPanel - Search
// ============================================================================

impl<C: CoordinatorClient> ControlPanel<C> {
    /// Searches addresses.
    ///
    /// A blank query returns no results without a request.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no geocoder is set
    /// - [`Error::Provider`] if the search fails
    pub async fn search(&self, query: &str) -> Result<Vec<GeocodeResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let geocoder = self
            .geocoder
            .as_ref()
            .ok_or_else(|| Error::config("No geocoder configured. Use .with_geocoder() to set one."))?;

        let results = geocoder.search(query).await?;
        debug!(query, count = results.len(), "Address search");
        Ok(results)
    }

    /// Selects a search result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCoordinate`] if the result is out of range.
    pub async fn choose_search_result(&mut self, result: &GeocodeResult) -> Result<()> {
        debug!(name = %result.display_name, "Search result chosen");
        self.select_point(result.latitude, result.longitude).await
    }
}

// ============================================================================
// ControlPanel - Saved Locations
// ============================================================================

impl<C: CoordinatorClient> ControlPanel<C> {
    /// Saves the current selection under `name`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidLocationName`] if `name` is blank
    /// - store errors; the list is left unchanged
    pub async fn save_location(&mut self, name: &str) -> Result<SavedLocation> {
        let mut saved = self.saved.clone();
        let location = saved.add(name, self.selection.clone())?;
        saved.persist(self.store.as_ref()).await?;
        self.saved = saved;

        info!(id = %location.id, name = %location.name, "Location saved");
        Ok(location)
    }

    /// Deletes a saved location.
    ///
    /// # Errors
    ///
    /// - [`Error::LocationNotFound`] if no entry has `id`
    /// - store errors; the list is left unchanged
    pub async fn delete_location(&mut self, id: LocationId) -> Result<SavedLocation> {
        let mut saved = self.saved.clone();
        let location = saved.remove(id)?;
        saved.persist(self.store.as_ref()).await?;
        self.saved = saved;

        info!(%id, name = %location.name, "Location deleted");
        Ok(location)
    }

    /// Selects a saved location.
    ///
    /// # Errors
    ///
    /// - [`Error::LocationNotFound`] if no entry has `id`
    /// - [`Error::InvalidCoordinate`] if the stored point is out of range
    pub async fn choose_saved_location(&mut self, id: LocationId) -> Result<()> {
        let coordinate = self
            .saved
            .get(id)
            .map(|location| location.coordinate.clone())
            .ok_or_else(|| Error::location_not_found(id))?;

        self.select_point(coordinate.latitude, coordinate.longitude)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
