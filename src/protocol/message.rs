//! Control panel messages.
//!
//! The control panel talks to the coordinator with four request types.
//!
//! | Message | Payload | Reply |
//! |---------|---------|-------|
//! | `SET_LOCATION` | coordinate | `updating` |
//! | `TOGGLE_SPOOFING` | `{ active }` | `spoofing` |
//! | `TOGGLE_IP_SYNC` | `{ active }` | `synced`, `syncStopped`, `syncFailed` |
//! | `GET_STATUS` | none | `status` |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

// ============================================================================
// ControlMessage
// ============================================================================

/// Request from the control panel to the coordinator.
///
/// # Format
///
/// ```json
/// { "type": "TOGGLE_SPOOFING", "payload": { "active": true } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ControlMessage {
    /// Use a new coordinate. Timezone is resolved by the coordinator.
    #[serde(rename = "SET_LOCATION")]
    SetLocation(Coordinate),

    /// Enable or disable spoofing.
    #[serde(rename = "TOGGLE_SPOOFING")]
    ToggleSpoofing {
        /// Requested state.
        active: bool,
    },

    /// Enable or disable IP based positioning.
    #[serde(rename = "TOGGLE_IP_SYNC")]
    ToggleIpSync {
        /// Requested state.
        active: bool,
    },

    /// Query the current state.
    #[serde(rename = "GET_STATUS")]
    GetStatus,
}

impl ControlMessage {
    /// Returns the wire name of the message.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SetLocation(_) => "SET_LOCATION",
            Self::ToggleSpoofing { .. } => "TOGGLE_SPOOFING",
            Self::ToggleIpSync { .. } => "TOGGLE_IP_SYNC",
            Self::GetStatus => "GET_STATUS",
        }
    }
}

// ============================================================================
// ControlReply
// ============================================================================

/// Reply from the coordinator to the control panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ControlReply {
    /// Location accepted; timezone resolution continues in the background.
    Updating,

    /// New spoofing state.
    Spoofing {
        /// Whether spoofing is now enabled.
        active: bool,
    },

    /// IP lookup succeeded and the coordinate was replaced.
    Synced {
        /// Coordinate derived from the IP address.
        #[serde(rename = "newCoords")]
        coordinate: Coordinate,
    },

    /// IP sync turned off.
    SyncStopped,

    /// IP sync turned on but every provider failed.
    SyncFailed,

    /// Current coordinator state.
    Status(StatusReport),
}

impl From<IpSyncOutcome> for ControlReply {
    fn from(outcome: IpSyncOutcome) -> Self {
        match outcome {
            IpSyncOutcome::Synced(coordinate) => Self::Synced { coordinate },
            IpSyncOutcome::Stopped => Self::SyncStopped,
            IpSyncOutcome::Failed => Self::SyncFailed,
        }
    }
}

// ============================================================================
// StatusReport
// ============================================================================

/// Snapshot of coordinator state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Spoofing enabled.
    pub active: bool,
    /// IP sync enabled.
    #[serde(rename = "ipSync")]
    pub ip_sync: bool,
    /// Current coordinate, if any.
    #[serde(rename = "coords")]
    pub coordinate: Option<Coordinate>,
}

// ============================================================================
// IpSyncOutcome
// ============================================================================

/// Result of toggling IP sync.
#[derive(Debug, Clone, PartialEq)]
pub enum IpSyncOutcome {
    /// Lookup succeeded; the coordinate is now current.
    Synced(Coordinate),
    /// Sync disabled.
    Stopped,
    /// Sync enabled but no provider answered.
    Failed,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_parse_set_location() {
        let message: ControlMessage = serde_json::from_value(json!({
            "type": "SET_LOCATION",
            "payload": { "lat": 48.8566, "long": 2.3522 }
        }))
        .expect("parse");

        assert_eq!(
            message,
            ControlMessage::SetLocation(Coordinate::new(48.8566, 2.3522))
        );
        assert_eq!(message.kind(), "SET_LOCATION");
    }

    #[test]
    fn test_parse_toggles() {
        let spoofing: ControlMessage = serde_json::from_value(json!({
            "type": "TOGGLE_SPOOFING",
            "payload": { "active": true }
        }))
        .expect("parse");
        let ip_sync: ControlMessage = serde_json::from_value(json!({
            "type": "TOGGLE_IP_SYNC",
            "payload": { "active": false }
        }))
        .expect("parse");

        assert_eq!(spoofing, ControlMessage::ToggleSpoofing { active: true });
        assert_eq!(ip_sync, ControlMessage::ToggleIpSync { active: false });
    }

    #[test]
    fn test_parse_get_status_without_payload() {
        let message: ControlMessage =
            serde_json::from_value(json!({ "type": "GET_STATUS" })).expect("parse");
        assert_eq!(message, ControlMessage::GetStatus);
    }

    #[test]
    fn test_reply_format() {
        let synced = ControlReply::from(IpSyncOutcome::Synced(Coordinate::new(1.5, 2.5)));
        assert_eq!(
            serde_json::to_value(&synced).expect("serialize"),
            json!({ "status": "synced", "newCoords": { "lat": 1.5, "long": 2.5 } })
        );

        let status = ControlReply::Status(StatusReport {
            active: true,
            ip_sync: false,
            coordinate: None,
        });
        assert_eq!(
            serde_json::to_value(&status).expect("serialize"),
            json!({ "status": "status", "active": true, "ipSync": false, "coords": null })
        );
    }

    #[test]
    fn test_ip_sync_outcomes_to_reply() {
        assert_eq!(ControlReply::from(IpSyncOutcome::Stopped), ControlReply::SyncStopped);
        assert_eq!(ControlReply::from(IpSyncOutcome::Failed), ControlReply::SyncFailed);
    }
}
