mod file;
mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    /// `None` means the id is unknown to the store.
    #[serde(default)]
    pub item: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertResponse {
    /// Identity of the stored document, newly assigned on first save.
    pub id: String,
    /// User-facing confirmation; independent of whether the write happened.
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_id_changed: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigResponse {
    #[serde(default)]
    pub cfg: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageProfilesResponse {
    #[serde(default)]
    pub imgprofiles: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub log: Option<Vec<String>>,
}

/// Remote CRUD for id-addressed documents. An `Err` is a transport failure.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    async fn fetch_by_id(&self, id: &str) -> Result<FetchResponse>;

    async fn upsert(&self, document: Value) -> Result<UpsertResponse>;

    async fn delete_by_id(&self, id: &str) -> Result<DeleteResponse>;
}

/// Remote access to the singleton application configuration and its companions.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn fetch_config(&self) -> Result<ConfigResponse>;

    async fn save_config(&self, config: Value) -> Result<SaveResponse>;

    async fn fetch_image_profiles(&self) -> Result<ImageProfilesResponse>;

    async fn save_image_profiles(&self, profiles: Value) -> Result<SaveResponse>;

    async fn create_backup(&self, target: &str) -> Result<BackupResponse>;
}

/// Persisted id carried by a document payload, ignoring the "new" sentinel.
pub(crate) fn payload_id(document: &Value) -> Option<String> {
    match document.get("id")? {
        Value::String(raw) => {
            let id = crate::domain::DocumentId::parse(raw);
            id.as_persisted().map(str::to_string)
        }
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}

pub(crate) fn stamp_id(document: &mut Value, id: &str) {
    if let Value::Object(map) = document {
        map.insert("id".to_string(), Value::String(id.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upsert_response_reads_backend_shape() {
        let response: UpsertResponse =
            serde_json::from_value(json!({"id": "42", "savedIdChanged": true})).unwrap();
        assert_eq!(response.id, "42");
        assert!(!response.success);
        assert_eq!(response.saved_id_changed, Some(true));
    }

    #[test]
    fn payload_id_skips_sentinel() {
        assert_eq!(payload_id(&json!({"id": "NEW"})), None);
        assert_eq!(payload_id(&json!({"id": 7})), Some("7".to_string()));
        assert_eq!(payload_id(&json!({"title": "x"})), None);
    }
}
