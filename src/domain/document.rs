use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::options::{DocumentProfile, SessionOptions};

use super::ids::DocumentId;

/// A record that can be bound to a [`DocumentSession`](crate::session::DocumentSession).
pub trait EditableDocument: Serialize + DeserializeOwned + Default + Send + Sync {
    fn id(&self) -> &DocumentId;

    fn set_id(&mut self, id: DocumentId);

    /// Display title; `None` when unset or blank.
    fn title(&self) -> Option<&str>;

    /// JSON schema the serialized document must satisfy before it is sent to the store.
    fn save_schema() -> Value;

    fn profile(options: &SessionOptions) -> &DocumentProfile;
}
