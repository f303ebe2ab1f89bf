#![deny(rust_2018_idioms)]

pub mod confirm;
pub mod domain;
pub mod error;
pub mod io;
pub mod modal;
pub mod notice;
pub mod options;
pub mod persistence;
pub mod session;
pub mod tabs;

#[cfg(test)]
mod tests;

pub use confirm::{AutoConfirm, ConfirmGate};
pub use domain::{
    AppConfig, CollectionEntry, DocumentId, EditableDocument, EntryKey, EntryKind, EntryList,
    ImageProfiles, Layout, NEW_DOCUMENT,
};
pub use error::{Operation, SessionError};
pub use io::{DocumentFormat, OutputDestination, OutputOptions, emit, parse_document_str};
pub use modal::{
    DialogKind, ModalAction, ModalBroker, ModalOutcome, ModalRequest, ModalResultChannel,
    PendingModal, ScriptedModal,
};
pub use options::{DirtyPolicy, DocumentProfile, SessionOptions, SettingsProfile};
pub use persistence::{
    BackupResponse, ConfigResponse, ConfigStore, DeleteResponse, FetchResponse, FileStore,
    ImageProfilesResponse, MemoryStore, PersistenceClient, SaveResponse, UpsertResponse,
};
pub use session::{
    BackupOutcome, CollectionMutator, Collaborators, ConfigSaveOutcome, ConfigSession,
    DeleteOutcome, DirtyTracker, DocumentSession, EditContext, EntryChange, RestartFlag,
    SaveOutcome, SessionPhase, UpdateMatch, fields,
};
pub use tabs::{TabCoordinator, TabId, TabRegistry};

pub mod prelude {
    pub use super::{
        AutoConfirm, Collaborators, ConfigSession, DocumentSession, Layout, MemoryStore,
        ModalBroker, SessionOptions, TabRegistry,
    };
}
