mod broker;
mod scripted;

use std::{fmt, str::FromStr};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::domain::EntryKind;

pub use broker::{ModalBroker, ModalHost, PendingModal};
pub use scripted::ScriptedModal;

/// Which dialog the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DialogKind {
    LayoutField,
    Bucket,
    CfDist,
    GlobalFunction,
    Bookmark,
    Feed,
    Variable,
    /// Categories are entered inline; the kind only names the field.
    Category,
    ImageProfile,
}

/// Input handed to a dialog when it opens.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalRequest {
    pub is_new: bool,
    /// Current content of the edited entry; `None` when adding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<Value>,
    /// Entry kinds the dialog may offer. Empty for fields without a kind tag.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accept: Vec<EntryKind>,
    /// Cross-references the dialog needs, e.g. the category list for feeds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalAction {
    Add,
    Update,
    Other(String),
}

impl ModalAction {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "add" | "addnew" => ModalAction::Add,
            "update" => ModalAction::Update,
            other => ModalAction::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ModalAction::Add => "add",
            ModalAction::Update => "update",
            ModalAction::Other(raw) => raw,
        }
    }
}

impl FromStr for ModalAction {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(ModalAction::from_wire(raw))
    }
}

impl fmt::Display for ModalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ModalAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ModalAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ModalAction::from_wire(&raw))
    }
}

/// Single resolution of a dialog. Cancellation is an explicit variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ModalOutcome {
    Cancelled,
    Resolved { action: ModalAction, payload: Value },
}

impl ModalOutcome {
    pub fn add(payload: Value) -> Self {
        ModalOutcome::Resolved {
            action: ModalAction::Add,
            payload,
        }
    }

    pub fn update(payload: Value) -> Self {
        ModalOutcome::Resolved {
            action: ModalAction::Update,
            payload,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ModalOutcome::Cancelled)
    }
}

/// Opens a dialog and resolves exactly once when it closes.
#[async_trait]
pub trait ModalResultChannel: Send + Sync {
    async fn open(&self, kind: DialogKind, request: ModalRequest) -> ModalOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn addnew_is_an_alias_for_add() {
        let action: ModalAction = serde_json::from_value(json!("addnew")).unwrap();
        assert_eq!(action, ModalAction::Add);
        let other: ModalAction = serde_json::from_value(json!("delete")).unwrap();
        assert_eq!(other, ModalAction::Other("delete".into()));
        assert_eq!(serde_json::to_value(ModalAction::Update).unwrap(), json!("update"));
    }

    #[test]
    fn request_serializes_like_dialog_data() {
        let request = ModalRequest {
            is_new: true,
            accept: vec![EntryKind::Text, EntryKind::Image],
            ..ModalRequest::default()
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"isNew": true, "accept": ["text", "image"]})
        );
    }
}
