use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use thiserror::Error;

use super::{TabCoordinator, TabId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSnapshot {
    pub id: TabId,
    pub title: String,
    pub document_id: Option<String>,
    pub dirty: bool,
    pub loading: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TabError {
    #[error("tab '{0}' is already open")]
    AlreadyOpen(TabId),
}

#[derive(Debug, Default)]
struct TabState {
    title: String,
    document_id: Option<String>,
    dirty: bool,
    loading: bool,
}

#[derive(Debug, Default)]
struct RegistryState {
    tabs: IndexMap<TabId, TabState>,
    stale: IndexMap<TabId, bool>,
    notifications: Vec<String>,
    navigation: Vec<String>,
}

/// In-memory tab bar. Every update happens under one lock so readers never observe a
/// half-applied rename.
#[derive(Debug, Default)]
pub struct TabRegistry {
    state: Mutex<RegistryState>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a tab. A second tab with the same id is rejected, which also keeps two
    /// sessions from editing the same persisted document.
    pub fn open(&self, tab: TabId, title: impl Into<String>) -> Result<(), TabError> {
        let mut state = self.lock();
        if state.tabs.contains_key(&tab) {
            return Err(TabError::AlreadyOpen(tab));
        }
        state.tabs.insert(
            tab,
            TabState {
                title: title.into(),
                loading: true,
                ..TabState::default()
            },
        );
        Ok(())
    }

    pub fn contains(&self, tab: &TabId) -> bool {
        self.lock().tabs.contains_key(tab)
    }

    pub fn tab_ids(&self) -> Vec<TabId> {
        self.lock().tabs.keys().cloned().collect()
    }

    pub fn snapshot(&self, tab: &TabId) -> Option<TabSnapshot> {
        let state = self.lock();
        state.tabs.get(tab).map(|entry| TabSnapshot {
            id: tab.clone(),
            title: entry.title.clone(),
            document_id: entry.document_id.clone(),
            dirty: entry.dirty,
            loading: entry.loading,
        })
    }

    pub fn title(&self, tab: &TabId) -> Option<String> {
        self.lock().tabs.get(tab).map(|entry| entry.title.clone())
    }

    pub fn is_dirty(&self, tab: &TabId) -> bool {
        self.lock().tabs.get(tab).is_some_and(|entry| entry.dirty)
    }

    pub fn is_loading(&self, tab: &TabId) -> bool {
        self.lock().tabs.get(tab).is_some_and(|entry| entry.loading)
    }

    pub fn is_stale(&self, list_tab: &TabId) -> bool {
        self.lock().stale.get(list_tab).copied().unwrap_or(false)
    }

    /// Read and reset the stale marker, as a list view does when it reloads.
    pub fn take_stale(&self, list_tab: &TabId) -> bool {
        self.lock().stale.insert(list_tab.clone(), false).unwrap_or(false)
    }

    pub fn notifications(&self) -> Vec<String> {
        self.lock().notifications.clone()
    }

    pub fn drain_notifications(&self) -> Vec<String> {
        std::mem::take(&mut self.lock().notifications)
    }

    pub fn navigation_history(&self) -> Vec<String> {
        self.lock().navigation.clone()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TabCoordinator for TabRegistry {
    fn set_title(&self, tab: &TabId, title: &str) {
        if let Some(entry) = self.lock().tabs.get_mut(tab) {
            entry.title = title.to_string();
        }
    }

    fn set_dirty(&self, tab: &TabId, dirty: bool) {
        if let Some(entry) = self.lock().tabs.get_mut(tab) {
            entry.dirty = dirty;
        }
    }

    fn set_loading(&self, tab: &TabId, loading: bool) {
        if let Some(entry) = self.lock().tabs.get_mut(tab) {
            entry.loading = loading;
        }
    }

    fn change_tab_id(&self, old: &TabId, new: &TabId, document_id: &str) {
        let mut state = self.lock();
        let Some(index) = state.tabs.get_index_of(old) else {
            tracing::warn!("change_tab_id: no tab '{old}' to rename to '{new}'");
            return;
        };
        let Some(mut entry) = state.tabs.shift_remove(old) else {
            return;
        };
        entry.document_id = Some(document_id.to_string());
        state.tabs.shift_insert(index, new.clone(), entry);
    }

    fn close_tab(&self, tab: &TabId) {
        self.lock().tabs.shift_remove(tab);
    }

    fn mark_data_stale(&self, list_tab: &TabId, stale: bool) {
        self.lock().stale.insert(list_tab.clone(), stale);
    }

    fn navigate_to(&self, path: &str) {
        self.lock().navigation.push(path.to_string());
    }

    fn notify(&self, message: &str) {
        self.lock().notifications.push(message.to_string());
    }
}
