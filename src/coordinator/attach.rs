//! Attach-and-override sequence.
//!
//! ```text
//! Idle ─► Attaching ─ok──────────────► GrantingPermission ─► EnablingPage ─► ApplyingOverride ─► Idle
//!             │                                                                  ▲
//!             ├─ already attached ───────────────────────────────────────────────┘
//!             └─ other error ─► Idle
//! ```
//!
//! A tab with a sequence in flight is not entered again: the second trigger
//! is dropped, not queued. Permission and page-domain failures are logged
//! and the sequence continues. There are no retries.

// ============================================================================
// Imports
// ============================================================================

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::host::DebugTarget;
use crate::identifiers::TabId;
use crate::protocol::DevToolsCommand;

use super::core::Coordinator;
use super::eligibility::is_eligible_url;
use super::geolocation::{OverrideOutcome, apply_override};

// ============================================================================
// AttachOutcome
// ============================================================================

/// Result of one attach-and-override sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachOutcome {
    /// A sequence for this tab was already running; nothing was done.
    AlreadyPending,
    /// Fresh session opened, then the override attempted.
    Attached(OverrideOutcome),
    /// A session already existed; the override was attempted directly.
    Reused(OverrideOutcome),
    /// The host refused to attach.
    Failed {
        /// Host error message.
        message: String,
    },
}

impl AttachOutcome {
    /// Returns the override result, if the sequence got that far.
    #[must_use]
    pub fn override_outcome(&self) -> Option<&OverrideOutcome> {
        match self {
            Self::Attached(outcome) | Self::Reused(outcome) => Some(outcome),
            Self::AlreadyPending | Self::Failed { .. } => None,
        }
    }

    /// Returns `true` if the geolocation override is in place.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.override_outcome()
            .is_some_and(OverrideOutcome::is_applied)
    }
}

// ============================================================================
// Coordinator - Attach
// ============================================================================

impl Coordinator {
    /// Runs the attach-and-override sequence on one tab.
    ///
    /// Does not check eligibility or the spoofing flag.
    pub async fn attach_and_override(&self, tab_id: TabId) -> AttachOutcome {
        let Some(_guard) = self.inner.pending.try_enter(tab_id) else {
            debug!(%tab_id, "Attach already in progress, dropping trigger");
            return AttachOutcome::AlreadyPending;
        };

        let instrumentation = self.inner.instrumentation.as_ref();
        let target = DebugTarget::tab(tab_id);

        debug!(%tab_id, "Attaching debugger");

        match instrumentation
            .attach(tab_id, &self.inner.options.protocol_version)
            .await
        {
            Ok(()) => {
                info!(%tab_id, "Debugger attached");

                match instrumentation
                    .send_command(&target, DevToolsCommand::grant_geolocation())
                    .await
                {
                    Ok(_) => debug!(%tab_id, "Geolocation permission granted"),
                    Err(e) => warn!(%tab_id, error = %e, "Permission grant failed"),
                }

                if let Err(e) = instrumentation
                    .send_command(&target, DevToolsCommand::PageEnable)
                    .await
                {
                    warn!(%tab_id, error = %e, "Page domain enable failed");
                }

                AttachOutcome::Attached(self.apply_current_override(&target).await)
            }

            Err(e) if e.is_already_attached() => {
                debug!(%tab_id, "Tab already attached, enforcing override");
                AttachOutcome::Reused(self.apply_current_override(&target).await)
            }

            Err(e) => {
                warn!(%tab_id, error = %e, "Attach failed");
                AttachOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Attaches to every eligible active tab of the focused window.
    ///
    /// Tabs are processed concurrently.
    pub async fn apply_to_active_tabs(&self) -> Vec<(TabId, AttachOutcome)> {
        let tabs = match self.inner.tabs.active_tabs().await {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!(error = %e, "Failed to query active tabs");
                return Vec::new();
            }
        };

        let prefixes = &self.inner.options.restricted_prefixes;
        let eligible: Vec<TabId> = tabs
            .into_iter()
            .filter(|tab| is_eligible_url(tab.url.as_deref(), prefixes))
            .map(|tab| tab.id)
            .collect();

        debug!(count = eligible.len(), "Applying override to active tabs");

        join_all(eligible.into_iter().map(|tab_id| async move {
            (tab_id, self.attach_and_override(tab_id).await)
        }))
        .await
    }

    /// Applies the coordinate current at this moment.
    async fn apply_current_override(&self, target: &DebugTarget) -> OverrideOutcome {
        let coordinate = self.inner.state.lock().coordinate.clone();
        let options = &self.inner.options;

        apply_override(
            self.inner.instrumentation.as_ref(),
            target,
            coordinate.as_ref(),
            options.accuracy,
            options.null_island_epsilon,
        )
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================
