use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Value, json};

use super::{
    BackupResponse, ConfigResponse, ConfigStore, DeleteResponse, FetchResponse,
    ImageProfilesResponse, PersistenceClient, SaveResponse, UpsertResponse, payload_id, stamp_id,
};

#[derive(Debug, Default)]
struct MemoryState {
    documents: IndexMap<String, Value>,
    last_id: u64,
    config: Option<Value>,
    image_profiles: Option<Value>,
    backups: IndexMap<String, Value>,
}

/// Store that keeps everything in process memory, in insertion order. Ids are allocated
/// as increasing integers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, id: &str, mut document: Value) -> Self {
        stamp_id(&mut document, id);
        {
            let mut state = self.lock();
            if let Ok(numeric) = id.parse::<u64>() {
                state.last_id = state.last_id.max(numeric);
            }
            state.documents.insert(id.to_string(), document);
        }
        self
    }

    pub fn with_config(self, config: Value) -> Self {
        self.lock().config = Some(config);
        self
    }

    pub fn with_image_profiles(self, profiles: Value) -> Self {
        self.lock().image_profiles = Some(profiles);
        self
    }

    pub fn document(&self, id: &str) -> Option<Value> {
        self.lock().documents.get(id).cloned()
    }

    pub fn document_ids(&self) -> Vec<String> {
        self.lock().documents.keys().cloned().collect()
    }

    pub fn config(&self) -> Option<Value> {
        self.lock().config.clone()
    }

    pub fn image_profiles(&self) -> Option<Value> {
        self.lock().image_profiles.clone()
    }

    pub fn backup(&self, target: &str) -> Option<Value> {
        self.lock().backups.get(target).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PersistenceClient for MemoryStore {
    async fn fetch_by_id(&self, id: &str) -> Result<FetchResponse> {
        Ok(FetchResponse {
            item: self.document(id),
        })
    }

    async fn upsert(&self, mut document: Value) -> Result<UpsertResponse> {
        let mut state = self.lock();
        let id = match payload_id(&document) {
            Some(id) => id,
            None => {
                state.last_id += 1;
                state.last_id.to_string()
            }
        };
        stamp_id(&mut document, &id);
        state.documents.insert(id.clone(), document);
        tracing::debug!(%id, "memory store saved document");
        Ok(UpsertResponse {
            id,
            success: true,
            saved_id_changed: None,
        })
    }

    async fn delete_by_id(&self, id: &str) -> Result<DeleteResponse> {
        let removed = self.lock().documents.shift_remove(id).is_some();
        Ok(DeleteResponse { success: removed })
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn fetch_config(&self) -> Result<ConfigResponse> {
        Ok(ConfigResponse { cfg: self.config() })
    }

    async fn save_config(&self, config: Value) -> Result<SaveResponse> {
        self.lock().config = Some(config);
        Ok(SaveResponse { success: true })
    }

    async fn fetch_image_profiles(&self) -> Result<ImageProfilesResponse> {
        Ok(ImageProfilesResponse {
            imgprofiles: self.image_profiles(),
        })
    }

    async fn save_image_profiles(&self, profiles: Value) -> Result<SaveResponse> {
        self.lock().image_profiles = Some(profiles);
        Ok(SaveResponse { success: true })
    }

    async fn create_backup(&self, target: &str) -> Result<BackupResponse> {
        let mut state = self.lock();
        let documents: Vec<Value> = state.documents.values().cloned().collect();
        let mut log = vec![format!("backing up {} document(s)", documents.len())];
        if state.config.is_some() {
            log.push("backing up configuration".to_string());
        }
        if state.image_profiles.is_some() {
            log.push("backing up image profiles".to_string());
        }
        let snapshot = json!({
            "documents": documents,
            "config": state.config.clone(),
            "imageprofiles": state.image_profiles.clone(),
        });
        state.backups.insert(target.to_string(), snapshot);
        log.push(format!("backup stored as '{target}'"));
        Ok(BackupResponse {
            success: true,
            log: Some(log),
        })
    }
}
