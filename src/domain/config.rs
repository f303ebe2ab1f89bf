use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entries::EntryList;

/// Global application configuration as edited on the settings tab.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "EntryList::is_absent")]
    pub buckets: EntryList,
    #[serde(default, skip_serializing_if = "EntryList::is_absent")]
    pub cfdists: EntryList,
    #[serde(default, skip_serializing_if = "EntryList::is_absent")]
    pub pug_global_scripts: EntryList,
    #[serde(default, skip_serializing_if = "EntryList::is_absent")]
    pub bookmarks: EntryList,
    #[serde(default, skip_serializing_if = "EntryList::is_absent")]
    pub feeds: EntryList,
    #[serde(default, skip_serializing_if = "EntryList::is_absent")]
    pub variables: EntryList,
    #[serde(default, skip_serializing_if = "EntryList::is_absent")]
    pub categories: EntryList,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppConfig {
    pub fn bucket_by_label(&self, label: &str) -> Option<&Value> {
        self.buckets
            .find_by_text("label", label)
            .map(|entry| entry.content())
    }

    pub fn category_names(&self) -> Vec<Value> {
        self.categories.contents()
    }
}

/// Image rendition profiles, stored independently of [`AppConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageProfiles {
    #[serde(
        rename = "lstProfiles",
        default,
        skip_serializing_if = "EntryList::is_absent"
    )]
    pub profiles: EntryList,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_bucket_by_label() {
        let config: AppConfig = serde_json::from_value(json!({
            "buckets": [
                {"label": "Prod", "bucketname": "site-prod"},
                {"label": "Test", "bucketname": "site-test"}
            ],
            "siteName": "demo"
        }))
        .unwrap();
        assert_eq!(
            config.bucket_by_label("Test").and_then(|b| b.get("bucketname")),
            Some(&json!("site-test"))
        );
        assert!(config.bucket_by_label("Stage").is_none());
        assert_eq!(config.extra["siteName"], json!("demo"));
    }

    #[test]
    fn image_profiles_use_wire_name() {
        let profiles: ImageProfiles =
            serde_json::from_value(json!({"lstProfiles": [{"id": "thumb"}]})).unwrap();
        assert_eq!(profiles.profiles.len(), 1);
        assert_eq!(
            serde_json::to_value(&profiles).unwrap(),
            json!({"lstProfiles": [{"id": "thumb"}]})
        );
    }
}
