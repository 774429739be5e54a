//! Location override coordinator.
//!
//! The [`Coordinator`] holds the spoof state and drives the host's debugger
//! API: attach to eligible tabs, apply position and timezone overrides, and
//! clear and detach when spoofing stops.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Coordinator handle and shared state |
//! | `builder` | Fluent configuration |
//! | `options` | Accuracy, protocol version, restricted URLs |
//! | `attach` | Attach-and-override sequence |
//! | `detach` | Clear and detach from all targets |
//! | `commands` | Control panel commands |
//! | `lifecycle` | Startup and host events |
//! | `geolocation` | Override application and coordinate checks |
//! | `eligibility` | Tab URL filter |
//! | `pending` | In-flight attach dedup |
//! | `state` | Spoof state and persistence |
//! | `persist` | Ordered background state writer |
//!
//! # Example
//!
//! ```ignore
//! let coordinator = Coordinator::builder()
//!     .host(host.clone())
//!     .store(store)
//!     .default_providers()
//!     .build()?;
//!
//! coordinator.startup().await;
//!
//! // Panel message
//! let reply = coordinator
//!     .handle_message(ControlMessage::ToggleSpoofing { active: true })
//!     .await;
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod attach;
mod builder;
mod commands;
mod core;
mod detach;
mod eligibility;
mod geolocation;
mod lifecycle;
mod options;
mod pending;
mod persist;
mod state;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use attach::AttachOutcome;
pub use builder::CoordinatorBuilder;
pub use core::Coordinator;
pub use eligibility::is_eligible_url;
pub use geolocation::{OverrideOutcome, SkipReason, check_coordinate};
pub use options::{CoordinatorOptions, DEFAULT_ACCURACY, DEFAULT_RESTRICTED_PREFIXES};
pub use pending::{PendingAttachSet, PendingGuard};
pub use state::SpoofState;
