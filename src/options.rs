use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    io::{DocumentFormat, decode_document_str},
    notice::{DocumentNotices, SettingsNotices},
    tabs::TabId,
};

/// When opening an add/edit dialog counts as a modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirtyPolicy {
    /// Mark dirty as soon as the dialog opens, even if it is later cancelled.
    #[default]
    OnOpen,
    /// Mark dirty only when a dialog outcome is applied to the document.
    OnConfirmedChange,
}

/// Labels and tab naming for one document kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentProfile {
    /// Prefix joined with the persisted id to form the owning tab id.
    pub tab_prefix: String,
    /// Tab hosting the sibling list view whose cache goes stale on save/delete.
    pub list_tab: String,
    pub new_title: String,
    pub untitled_title: String,
    pub key_required: String,
    pub delete_prompt: String,
    pub notices: DocumentNotices,
}

impl DocumentProfile {
    pub fn layout() -> Self {
        Self {
            tab_prefix: "tab-layout-".to_string(),
            list_tab: "tab-layouts".to_string(),
            new_title: "New Layout".to_string(),
            untitled_title: "Untitled Layout".to_string(),
            key_required: "Key name is required!".to_string(),
            delete_prompt: "Do you really want to delete this object?".to_string(),
            notices: DocumentNotices::for_kind("layout"),
        }
    }

    pub fn tab_for(&self, document_id: &str) -> TabId {
        TabId::new(format!("{}{}", self.tab_prefix, document_id))
    }

    pub fn list_tab_id(&self) -> TabId {
        TabId::new(self.list_tab.clone())
    }
}

impl Default for DocumentProfile {
    fn default() -> Self {
        Self::layout()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsProfile {
    pub tab: String,
    pub remove_prompt: String,
    pub restart_prompt: String,
    pub backup_prompt: String,
    pub backup_target_required: String,
    pub notices: SettingsNotices,
}

impl SettingsProfile {
    pub fn tab_id(&self) -> TabId {
        TabId::new(self.tab.clone())
    }
}

impl Default for SettingsProfile {
    fn default() -> Self {
        Self {
            tab: "tab-settings".to_string(),
            remove_prompt: "Delete this entry?".to_string(),
            restart_prompt: "Restart of Webapplication recommended.\nRestart now?".to_string(),
            backup_prompt: "Create database backup?".to_string(),
            backup_target_required: "You must select a bucket.".to_string(),
            notices: SettingsNotices::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    pub dirty_policy: DirtyPolicy,
    /// Delay before a freshly created document clears its tab's loading indicator.
    pub new_document_settle_ms: u64,
    pub layout: DocumentProfile,
    pub settings: SettingsProfile,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            dirty_policy: DirtyPolicy::OnOpen,
            new_document_settle_ms: 0,
            layout: DocumentProfile::layout(),
            settings: SettingsProfile::default(),
        }
    }
}

impl SessionOptions {
    pub fn with_dirty_policy(mut self, policy: DirtyPolicy) -> Self {
        self.dirty_policy = policy;
        self
    }

    pub fn with_new_document_settle(mut self, delay: Duration) -> Self {
        self.new_document_settle_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_layout_profile(mut self, profile: DocumentProfile) -> Self {
        self.layout = profile;
        self
    }

    pub fn with_settings_profile(mut self, profile: SettingsProfile) -> Self {
        self.settings = profile;
        self
    }

    pub fn new_document_settle(&self) -> Duration {
        Duration::from_millis(self.new_document_settle_ms)
    }

    /// Parse options from a JSON/YAML/TOML document. Missing keys keep their defaults.
    pub fn from_document_str(contents: &str, format: DocumentFormat) -> Result<Self> {
        decode_document_str(contents, format).context("invalid session options")
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read options file {}", path.display()))?;
        let format = DocumentFormat::from_path(path).unwrap_or_default();
        Self::from_document_str(&contents, format)
    }
}
