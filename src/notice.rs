use serde::{Deserialize, Serialize};

/// Notification texts for one editable document kind. Each failure path has its own
/// fixed message so the operator can tell which step went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentNotices {
    pub not_found: String,
    pub load_failed: String,
    pub saved: String,
    pub save_failed: String,
    pub deleted: String,
    pub delete_failed: String,
}

impl DocumentNotices {
    pub fn for_kind(kind: &str) -> Self {
        Self {
            not_found: format!("{} not found", capitalize(kind)),
            load_failed: format!("Error while loading {kind}"),
            saved: "Document saved".to_string(),
            save_failed: format!("Error while saving {kind}"),
            deleted: "Document deleted".to_string(),
            delete_failed: "Error while deleting".to_string(),
        }
    }
}

impl Default for DocumentNotices {
    fn default() -> Self {
        Self::for_kind("layout")
    }
}

/// Notification texts for the settings tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsNotices {
    pub load_failed: String,
    pub image_profiles_load_failed: String,
    pub saved: String,
    pub save_failed: String,
    pub image_profiles_save_failed: String,
    pub backup_saved: String,
    pub backup_failed: String,
}

impl Default for SettingsNotices {
    fn default() -> Self {
        Self {
            load_failed: "Error while loading".to_string(),
            image_profiles_load_failed: "Error while loading imageprofiles".to_string(),
            saved: "Configuration saved".to_string(),
            save_failed: "Error while saving configuration".to_string(),
            image_profiles_save_failed: "Error while saving image profiles".to_string(),
            backup_saved: "Backup saved to S3 bucket".to_string(),
            backup_failed: "Error while creating backup".to_string(),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
