use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;

use crate::{
    Collaborators, ConfirmGate, DocumentSession, Layout, ModalOutcome, ScriptedModal,
    SessionOptions,
    persistence::{
        BackupResponse, ConfigResponse, ConfigStore, DeleteResponse, FetchResponse,
        ImageProfilesResponse, PersistenceClient, SaveResponse, UpsertResponse,
    },
    tabs::{TabCoordinator, TabId, TabRegistry},
};

/// One call received by [`RecordingTabs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabCall {
    Title(TabId, String),
    Dirty(TabId, bool),
    Loading(TabId, bool),
    Rekey(TabId, TabId, String),
    Close(TabId),
    Stale(TabId, bool),
    Navigate(String),
    Notify(String),
}

/// Tab registry that also keeps the raw call log.
#[derive(Default)]
pub struct RecordingTabs {
    pub registry: TabRegistry,
    calls: Mutex<Vec<TabCall>>,
}

impl RecordingTabs {
    pub fn with_tab(tab: &str, title: &str) -> Arc<Self> {
        let tabs = Self::default();
        tabs.registry.open(TabId::from(tab), title).unwrap();
        Arc::new(tabs)
    }

    pub fn calls(&self) -> Vec<TabCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn dirty_calls(&self) -> Vec<bool> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TabCall::Dirty(_, dirty) => Some(dirty),
                _ => None,
            })
            .collect()
    }

    pub fn rekeys(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, TabCall::Rekey(..)))
            .count()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.registry.notifications()
    }

    fn record(&self, call: TabCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl TabCoordinator for RecordingTabs {
    fn set_title(&self, tab: &TabId, title: &str) {
        self.record(TabCall::Title(tab.clone(), title.to_string()));
        self.registry.set_title(tab, title);
    }

    fn set_dirty(&self, tab: &TabId, dirty: bool) {
        self.record(TabCall::Dirty(tab.clone(), dirty));
        self.registry.set_dirty(tab, dirty);
    }

    fn set_loading(&self, tab: &TabId, loading: bool) {
        self.record(TabCall::Loading(tab.clone(), loading));
        self.registry.set_loading(tab, loading);
    }

    fn change_tab_id(&self, old: &TabId, new: &TabId, document_id: &str) {
        self.record(TabCall::Rekey(old.clone(), new.clone(), document_id.to_string()));
        self.registry.change_tab_id(old, new, document_id);
    }

    fn close_tab(&self, tab: &TabId) {
        self.record(TabCall::Close(tab.clone()));
        self.registry.close_tab(tab);
    }

    fn mark_data_stale(&self, list_tab: &TabId, stale: bool) {
        self.record(TabCall::Stale(list_tab.clone(), stale));
        self.registry.mark_data_stale(list_tab, stale);
    }

    fn navigate_to(&self, path: &str) {
        self.record(TabCall::Navigate(path.to_string()));
        self.registry.navigate_to(path);
    }

    fn notify(&self, message: &str) {
        self.record(TabCall::Notify(message.to_string()));
        self.registry.notify(message);
    }
}

/// Confirmation gate with a fixed answer that remembers every prompt.
pub struct RecordingConfirm {
    answer: bool,
    prompts: Mutex<Vec<String>>,
}

impl RecordingConfirm {
    pub fn answering(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl ConfirmGate for RecordingConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
    }
}

/// Store answering from per-operation queues. An empty queue is a transport failure.
#[derive(Default)]
pub struct ScriptedStore {
    fetches: Mutex<VecDeque<Result<FetchResponse>>>,
    upserts: Mutex<VecDeque<Result<UpsertResponse>>>,
    deletes: Mutex<VecDeque<Result<DeleteResponse>>>,
    configs: Mutex<VecDeque<Result<ConfigResponse>>>,
    profiles: Mutex<VecDeque<Result<ImageProfilesResponse>>>,
    config_saves: Mutex<VecDeque<Result<SaveResponse>>>,
    profile_saves: Mutex<VecDeque<Result<SaveResponse>>>,
    backups: Mutex<VecDeque<Result<BackupResponse>>>,
    upserted: Mutex<Vec<Value>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn expect_fetch(&self, response: Result<FetchResponse>) -> &Self {
        self.fetches.lock().unwrap().push_back(response);
        self
    }

    pub fn expect_upsert(&self, response: Result<UpsertResponse>) -> &Self {
        self.upserts.lock().unwrap().push_back(response);
        self
    }

    pub fn expect_delete(&self, response: Result<DeleteResponse>) -> &Self {
        self.deletes.lock().unwrap().push_back(response);
        self
    }

    pub fn expect_config(&self, response: Result<ConfigResponse>) -> &Self {
        self.configs.lock().unwrap().push_back(response);
        self
    }

    pub fn expect_image_profiles(&self, response: Result<ImageProfilesResponse>) -> &Self {
        self.profiles.lock().unwrap().push_back(response);
        self
    }

    pub fn expect_config_save(&self, response: Result<SaveResponse>) -> &Self {
        self.config_saves.lock().unwrap().push_back(response);
        self
    }

    pub fn expect_profile_save(&self, response: Result<SaveResponse>) -> &Self {
        self.profile_saves.lock().unwrap().push_back(response);
        self
    }

    pub fn expect_backup(&self, response: Result<BackupResponse>) -> &Self {
        self.backups.lock().unwrap().push_back(response);
        self
    }

    pub fn upserted(&self) -> Vec<Value> {
        self.upserted.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn next<T>(&self, name: &str, queue: &Mutex<VecDeque<Result<T>>>) -> Result<T> {
        self.calls.lock().unwrap().push(name.to_string());
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no scripted answer for {name}")))
    }
}

#[async_trait]
impl PersistenceClient for ScriptedStore {
    async fn fetch_by_id(&self, id: &str) -> Result<FetchResponse> {
        self.next(&format!("fetch {id}"), &self.fetches)
    }

    async fn upsert(&self, document: Value) -> Result<UpsertResponse> {
        self.upserted.lock().unwrap().push(document);
        self.next("upsert", &self.upserts)
    }

    async fn delete_by_id(&self, id: &str) -> Result<DeleteResponse> {
        self.next(&format!("delete {id}"), &self.deletes)
    }
}

#[async_trait]
impl ConfigStore for ScriptedStore {
    async fn fetch_config(&self) -> Result<ConfigResponse> {
        self.next("fetch config", &self.configs)
    }

    async fn save_config(&self, _config: Value) -> Result<SaveResponse> {
        self.next("save config", &self.config_saves)
    }

    async fn fetch_image_profiles(&self) -> Result<ImageProfilesResponse> {
        self.next("fetch image profiles", &self.profiles)
    }

    async fn save_image_profiles(&self, _profiles: Value) -> Result<SaveResponse> {
        self.next("save image profiles", &self.profile_saves)
    }

    async fn create_backup(&self, target: &str) -> Result<BackupResponse> {
        self.next(&format!("backup {target}"), &self.backups)
    }
}

/// Store whose calls never complete.
pub struct StalledStore;

#[async_trait]
impl PersistenceClient for StalledStore {
    async fn fetch_by_id(&self, _id: &str) -> Result<FetchResponse> {
        std::future::pending().await
    }

    async fn upsert(&self, _document: Value) -> Result<UpsertResponse> {
        std::future::pending().await
    }

    async fn delete_by_id(&self, _id: &str) -> Result<DeleteResponse> {
        std::future::pending().await
    }
}

pub struct Harness {
    pub tabs: Arc<RecordingTabs>,
    pub modal: Arc<ScriptedModal>,
    pub confirm: Arc<RecordingConfirm>,
}

impl Harness {
    pub fn new(tab: &str, answers: Vec<ModalOutcome>, confirm: bool) -> Self {
        Self {
            tabs: RecordingTabs::with_tab(tab, "Loading"),
            modal: Arc::new(ScriptedModal::new(answers)),
            confirm: RecordingConfirm::answering(confirm),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(self.tabs.clone(), self.modal.clone(), self.confirm.clone())
    }

    pub fn layout_session(
        &self,
        id: &str,
        store: Arc<dyn PersistenceClient>,
        options: SessionOptions,
    ) -> DocumentSession<Layout> {
        let tab = TabId::new(format!("tab-layout-{id}"));
        DocumentSession::new(id, tab, store, self.collaborators(), options).unwrap()
    }
}

pub fn upserted(id: &str, success: bool) -> Result<UpsertResponse> {
    Ok(UpsertResponse {
        id: id.to_string(),
        success,
        saved_id_changed: None,
    })
}
