use crate::tabs::{TabCoordinator, TabId};

/// Unsaved-change flag of one session. The coordinator only hears about real
/// transitions, never about a repeated value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DirtyTracker {
    dirty: bool,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns `true` when the state changed and the tab was told about it.
    ///
    /// The tab id is passed per call because a session's tab is re-keyed on first save.
    pub fn set(&mut self, dirty: bool, tabs: &dyn TabCoordinator, tab: &TabId) -> bool {
        if self.dirty == dirty {
            return false;
        }
        self.dirty = dirty;
        tracing::debug!(%tab, dirty, "dirty state changed");
        tabs.set_dirty(tab, dirty);
        true
    }
}

/// Sticky "restart recommended" marker of the settings session. Once raised it stays
/// raised until the session ends; saving does not clear it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RestartFlag {
    raised: bool,
}

impl RestartFlag {
    pub fn raise(&mut self) {
        if !self.raised {
            tracing::debug!("restart recommended for this settings session");
        }
        self.raised = true;
    }

    pub fn is_raised(&self) -> bool {
        self.raised
    }
}
