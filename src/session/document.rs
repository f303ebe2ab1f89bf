use std::sync::Arc;

use crate::{
    domain::{DocumentId, EditableDocument},
    error::{Operation, SessionError},
    options::{DocumentProfile, SessionOptions},
    persistence::{FetchResponse, PersistenceClient},
    tabs::TabId,
};

use super::{
    Collaborators,
    collection::EditContext,
    dirty::DirtyTracker,
    state::SessionPhase,
    validation::SaveGate,
};

/// What a completed save did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    /// The document received a new server identity and its tab was re-keyed.
    pub identity_changed: bool,
    /// The store confirmed the save to the user; only then is the dirty flag cleared.
    pub confirmed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The confirmation prompt was declined; nothing happened.
    Declined,
    /// The store removed the document and the tab was closed.
    Deleted,
    /// The store refused; the document and its tab remain.
    Failed,
    /// The document was never saved, so the tab was closed without a store call.
    Discarded,
}

/// Load/save/delete lifecycle of one document bound to one tab.
pub struct DocumentSession<D> {
    document: Option<D>,
    document_id: DocumentId,
    tab: TabId,
    phase: SessionPhase,
    dirty: DirtyTracker,
    loading: bool,
    initialized: bool,
    gate: SaveGate,
    profile: DocumentProfile,
    options: SessionOptions,
    store: Arc<dyn PersistenceClient>,
    collaborators: Collaborators,
}

impl<D: EditableDocument> DocumentSession<D> {
    /// Bind a session to `tab`. `document_id` may be the "new" sentinel.
    pub fn new(
        document_id: &str,
        tab: TabId,
        store: Arc<dyn PersistenceClient>,
        collaborators: Collaborators,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        let gate = SaveGate::compile(&D::save_schema())?;
        let profile = D::profile(&options).clone();
        Ok(Self {
            document: None,
            document_id: DocumentId::parse(document_id),
            tab,
            phase: SessionPhase::Loading,
            dirty: DirtyTracker::new(),
            loading: false,
            initialized: false,
            gate,
            profile,
            options,
            store,
            collaborators,
        })
    }

    /// Create a default document for a new id, or fetch an existing one exactly once.
    ///
    /// A missing document or a failed fetch is reported through the coordinator and
    /// leaves the session usable with no document bound.
    pub async fn initialize(&mut self) -> Result<(), SessionError> {
        self.phase.ensure_loadable(!self.initialized)?;
        self.initialized = true;
        self.phase = SessionPhase::Loading;
        self.set_loading(true);

        let result = match self.document_id.clone() {
            DocumentId::New => {
                self.bind(D::default());
                self.collaborators
                    .tabs
                    .set_title(&self.tab, &self.profile.new_title);
                let settle = self.options.new_document_settle();
                if !settle.is_zero() {
                    tokio::time::sleep(settle).await;
                }
                Ok(())
            }
            DocumentId::Persisted(id) => self.fetch(&id).await,
        };

        self.phase = SessionPhase::Ready;
        self.set_loading(false);
        result
    }

    async fn fetch(&mut self, id: &str) -> Result<(), SessionError> {
        tracing::debug!(%id, tab = %self.tab, "loading document");
        let response = match self.store.fetch_by_id(id).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(%id, error = %err, "document load failed");
                self.unbind();
                self.notify(&self.profile.notices.load_failed);
                return Err(SessionError::transport(Operation::Load, &err));
            }
        };
        let FetchResponse { item: Some(item) } = response else {
            tracing::debug!(%id, "document not found");
            self.unbind();
            self.notify(&self.profile.notices.not_found);
            return Ok(());
        };
        let mut document: D = match serde_json::from_value(item) {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(%id, error = %err, "stored document could not be decoded");
                self.unbind();
                self.notify(&self.profile.notices.load_failed);
                return Err(SessionError::Decode(err));
            }
        };
        if document.id().is_new() {
            document.set_id(self.document_id.clone());
        }
        let title = document
            .title()
            .unwrap_or(self.profile.untitled_title.as_str())
            .to_string();
        self.collaborators.tabs.set_title(&self.tab, &title);
        self.bind(document);
        Ok(())
    }

    fn bind(&mut self, document: D) {
        self.document = Some(document);
        self.dirty
            .set(false, self.collaborators.tabs.as_ref(), &self.tab);
    }

    /// A reload that finds nothing must not leave the previous document editable.
    fn unbind(&mut self) {
        self.document = None;
        self.dirty
            .set(false, self.collaborators.tabs.as_ref(), &self.tab);
    }

    /// Validate, then upsert. The first save of a new document re-keys the tab to the
    /// server identity before the identity is written onto the document.
    pub async fn save(&mut self) -> Result<SaveOutcome, SessionError> {
        self.phase.ensure_ready()?;
        let Some(document) = self.document.as_ref() else {
            return Err(SessionError::Unbound);
        };
        let payload = serde_json::to_value(document).map_err(SessionError::Encode)?;
        self.gate.check(&payload, &self.profile.key_required)?;

        self.phase = SessionPhase::Saving;
        self.set_loading(true);
        tracing::debug!(tab = %self.tab, id = %self.document_id, "saving document");

        let response = match self.store.upsert(payload).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(tab = %self.tab, error = %err, "document save failed");
                self.notify(&self.profile.notices.save_failed);
                self.settle();
                return Err(SessionError::transport(Operation::Save, &err));
            }
        };

        let assigned = DocumentId::parse(&response.id);
        let identity_changed = !assigned.is_new()
            && response
                .saved_id_changed
                .unwrap_or(assigned != self.document_id);
        if identity_changed {
            let new_tab = self.profile.tab_for(&response.id);
            self.collaborators
                .tabs
                .change_tab_id(&self.tab, &new_tab, &response.id);
            self.tab = new_tab;
            self.document_id = assigned.clone();
            if let Some(document) = self.document.as_mut() {
                document.set_id(assigned);
            }
        }

        let title = self
            .document
            .as_ref()
            .and_then(|document| document.title())
            .unwrap_or(self.profile.untitled_title.as_str());
        self.collaborators.tabs.set_title(&self.tab, title);
        self.collaborators
            .tabs
            .mark_data_stale(&self.profile.list_tab_id(), true);

        if response.success {
            self.notify(&self.profile.notices.saved);
            self.dirty
                .set(false, self.collaborators.tabs.as_ref(), &self.tab);
            tracing::info!(tab = %self.tab, id = %self.document_id, "document saved");
        }
        self.settle();
        Ok(SaveOutcome {
            identity_changed,
            confirmed: response.success,
        })
    }

    /// Delete after confirmation. On success the tab is closed and the session ends.
    pub async fn delete(&mut self) -> Result<DeleteOutcome, SessionError> {
        self.phase.ensure_ready()?;
        if !self
            .collaborators
            .confirm
            .confirm(&self.profile.delete_prompt)
        {
            return Ok(DeleteOutcome::Declined);
        }
        let Some(id) = self.document_id.as_persisted().map(str::to_string) else {
            tracing::info!(tab = %self.tab, "discarding unsaved document");
            self.end();
            return Ok(DeleteOutcome::Discarded);
        };

        self.phase = SessionPhase::Deleting;
        self.set_loading(true);
        tracing::debug!(%id, tab = %self.tab, "deleting document");

        match self.store.delete_by_id(&id).await {
            Ok(response) if response.success => {
                self.notify(&self.profile.notices.deleted);
                self.collaborators
                    .tabs
                    .mark_data_stale(&self.profile.list_tab_id(), true);
                tracing::info!(%id, "document deleted");
                self.end();
                Ok(DeleteOutcome::Deleted)
            }
            Ok(_) => {
                tracing::debug!(%id, "store refused to delete document");
                self.notify(&self.profile.notices.delete_failed);
                self.settle();
                Ok(DeleteOutcome::Failed)
            }
            Err(err) => {
                tracing::warn!(%id, error = %err, "document delete failed");
                self.notify(&self.profile.notices.delete_failed);
                self.settle();
                Err(SessionError::transport(Operation::Delete, &err))
            }
        }
    }

    /// Recover after a save, delete or load future was dropped before it finished.
    /// Returns `false` when nothing was pending.
    pub fn abandon_pending(&mut self) -> bool {
        let Some(operation) = self.phase.in_flight() else {
            return false;
        };
        if operation == Operation::Load && !self.initialized {
            return false;
        }
        tracing::debug!(tab = %self.tab, %operation, "abandoning pending operation");
        self.settle();
        true
    }

    /// Apply a direct edit to the bound document and mark it dirty.
    pub fn modify<R>(&mut self, change: impl FnOnce(&mut D) -> R) -> Result<R, SessionError> {
        if self.phase.is_closed() {
            return Err(SessionError::Closed);
        }
        let document = self.document.as_mut().ok_or(SessionError::Unbound)?;
        let result = change(document);
        self.dirty
            .set(true, self.collaborators.tabs.as_ref(), &self.tab);
        Ok(result)
    }

    /// Borrow the session for a collection operation. `None` when no document is bound
    /// or the session has ended.
    pub fn edit(&mut self) -> Option<EditContext<'_, D>> {
        if self.phase.is_closed() {
            return None;
        }
        let document = self.document.as_mut()?;
        Some(EditContext {
            document,
            dirty: &mut self.dirty,
            restart: None,
            tab: &self.tab,
            collaborators: &self.collaborators,
            policy: self.options.dirty_policy,
            remove_prompt: &self.options.settings.remove_prompt,
        })
    }

    pub fn navigate_to(&self, path: &str) {
        self.collaborators.tabs.navigate_to(path);
    }

    /// Close the tab without saving.
    pub fn close(&mut self) {
        if !self.phase.is_closed() {
            self.end();
        }
    }

    pub fn document(&self) -> Option<&D> {
        self.document.as_ref()
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    pub fn tab_id(&self) -> &TabId {
        &self.tab
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn notify(&self, message: &str) {
        self.collaborators.tabs.notify(message);
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        self.collaborators.tabs.set_loading(&self.tab, loading);
    }

    fn settle(&mut self) {
        self.phase = SessionPhase::Ready;
        self.set_loading(false);
    }

    fn end(&mut self) {
        self.collaborators.tabs.close_tab(&self.tab);
        self.loading = false;
        self.phase = SessionPhase::Closed;
    }
}
