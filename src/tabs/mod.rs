mod registry;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use registry::{TabError, TabRegistry, TabSnapshot};

/// Identifier of an editor tab, e.g. `tab-layout-42` or `tab-settings`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    pub fn new(raw: impl Into<String>) -> Self {
        TabId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TabId {
    fn from(raw: &str) -> Self {
        TabId::new(raw)
    }
}

/// Owner of the tab bar. Sessions push every visible side effect through this trait.
pub trait TabCoordinator: Send + Sync {
    fn set_title(&self, tab: &TabId, title: &str);

    fn set_dirty(&self, tab: &TabId, dirty: bool);

    /// Loading indicator of one tab; other tabs are unaffected.
    fn set_loading(&self, tab: &TabId, loading: bool);

    /// Re-key a tab once its document received a server identity.
    fn change_tab_id(&self, old: &TabId, new: &TabId, document_id: &str);

    fn close_tab(&self, tab: &TabId);

    /// Flag the cached data of a list view as outdated.
    fn mark_data_stale(&self, list_tab: &TabId, stale: bool);

    fn navigate_to(&self, path: &str);

    fn notify(&self, message: &str);
}
