//! Tabs with an attach sequence in flight.
//!
//! Entering returns a guard; dropping the guard releases the tab on every
//! exit path, including early returns and panics.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::identifiers::TabId;

// ============================================================================
// PendingAttachSet
// ============================================================================

/// Set of tabs whose attach sequence has not finished.
#[derive(Debug, Default)]
pub struct PendingAttachSet {
    tabs: Mutex<FxHashSet<TabId>>,
}

impl PendingAttachSet {
    /// Creates an empty set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a tab as pending.
    ///
    /// Returns `None` if the tab is already pending.
    #[must_use]
    pub fn try_enter(&self, tab_id: TabId) -> Option<PendingGuard<'_>> {
        if self.tabs.lock().insert(tab_id) {
            Some(PendingGuard { set: self, tab_id })
        } else {
            None
        }
    }

    /// Returns `true` if the tab is pending.
    #[inline]
    #[must_use]
    pub fn contains(&self, tab_id: TabId) -> bool {
        self.tabs.lock().contains(&tab_id)
    }

    /// Returns the number of pending tabs.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tabs.lock().len()
    }

    /// Returns `true` if no tab is pending.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tabs.lock().is_empty()
    }
}

// ============================================================================
// PendingGuard
// ============================================================================

/// Releases a pending tab when dropped.
#[derive(Debug)]
pub struct PendingGuard<'a> {
    set: &'a PendingAttachSet,
    tab_id: TabId,
}

impl PendingGuard<'_> {
    /// Returns the guarded tab.
    #[inline]
    #[must_use]
    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.set.tabs.lock().remove(&self.tab_id);
    }
}

// ============================================================================
// Tests
// ============================================================================
