mod collection;
mod config;
mod dirty;
mod document;
pub mod fields;
mod state;
mod validation;

use std::sync::Arc;

use crate::{confirm::ConfirmGate, modal::ModalResultChannel, tabs::TabCoordinator};

pub use collection::{CollectionMutator, EditContext, EntryChange, UpdateMatch};
pub use config::{BackupOutcome, ConfigSaveOutcome, ConfigSession};
pub use dirty::{DirtyTracker, RestartFlag};
pub use document::{DeleteOutcome, DocumentSession, SaveOutcome};
pub use state::SessionPhase;

/// The collaborators every session talks to. Cloning shares them.
#[derive(Clone)]
pub struct Collaborators {
    pub tabs: Arc<dyn TabCoordinator>,
    pub modal: Arc<dyn ModalResultChannel>,
    pub confirm: Arc<dyn ConfirmGate>,
}

impl Collaborators {
    pub fn new(
        tabs: Arc<dyn TabCoordinator>,
        modal: Arc<dyn ModalResultChannel>,
        confirm: Arc<dyn ConfirmGate>,
    ) -> Self {
        Self {
            tabs,
            modal,
            confirm,
        }
    }
}
