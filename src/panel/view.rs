//! Display model for the control panel.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::geo::Coordinate;

// ============================================================================
// PanelView
// ============================================================================

/// What the panel shows, already formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelView {
    /// Selected latitude, 4 decimals.
    pub latitude: String,
    /// Selected longitude, 4 decimals.
    pub longitude: String,
    /// `ON` or `OFF`.
    pub ip_sync_label: &'static str,
    /// Spoofing status line.
    pub state_label: &'static str,
    /// Spoofing toggle caption.
    pub button_label: &'static str,
    /// Drives the highlighted button style.
    pub active: bool,
}

impl PanelView {
    /// Formats the panel state.
    #[must_use]
    pub fn new(selection: &Coordinate, spoofing: bool, ip_sync: bool) -> Self {
        Self {
            latitude: format!("{:.4}", selection.latitude),
            longitude: format!("{:.4}", selection.longitude),
            ip_sync_label: if ip_sync { "ON" } else { "OFF" },
            state_label: if spoofing {
                "Active (Debugging)"
            } else {
                "Inactive"
            },
            button_label: if spoofing {
                "Stop Spoofing"
            } else {
                "Start Spoofing"
            },
            active: spoofing,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_view() {
        let view = PanelView::new(&Coordinate::DEFAULT, false, false);

        assert_eq!(view.latitude, "37.7749");
        assert_eq!(view.longitude, "-122.4194");
        assert_eq!(view.ip_sync_label, "OFF");
        assert_eq!(view.state_label, "Inactive");
        assert_eq!(view.button_label, "Start Spoofing");
        assert!(!view.active);
    }

    #[test]
    fn test_active_view_rounds() {
        let view = PanelView::new(&Coordinate::new(48.856_613, 2.352_222), true, true);

        assert_eq!(view.latitude, "48.8566");
        assert_eq!(view.longitude, "2.3522");
        assert_eq!(view.ip_sync_label, "ON");
        assert_eq!(view.state_label, "Active (Debugging)");
        assert_eq!(view.button_label, "Stop Spoofing");
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(PanelView::new(&Coordinate::DEFAULT, true, false))
            .expect("serialize");
        assert_eq!(json["ipSyncLabel"], "OFF");
        assert_eq!(json["buttonLabel"], "Stop Spoofing");
    }
}
