use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::options::{DocumentProfile, SessionOptions};

use super::{document::EditableDocument, entries::EntryList, ids::DocumentId};

/// Content-layout schema: a keyed template with an ordered list of custom fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    #[serde(default, skip_serializing_if = "DocumentId::is_new")]
    pub id: DocumentId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub okey: Option<String>,
    #[serde(default, skip_serializing_if = "EntryList::is_absent")]
    pub cust_fields: EntryList,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            id: DocumentId::New,
            title: String::new(),
            okey: None,
            cust_fields: EntryList::empty(),
            extra: Map::new(),
        }
    }
}

impl Layout {
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.okey = Some(key.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

impl EditableDocument for Layout {
    fn id(&self) -> &DocumentId {
        &self.id
    }

    fn set_id(&mut self, id: DocumentId) {
        self.id = id;
    }

    fn title(&self) -> Option<&str> {
        let title = self.title.trim();
        (!title.is_empty()).then_some(title)
    }

    fn save_schema() -> Value {
        json!({
            "type": "object",
            "required": ["okey"],
            "properties": {
                "okey": {"type": "string", "minLength": 1}
            }
        })
    }

    fn profile(options: &SessionOptions) -> &DocumentProfile {
        &options.layout
    }
}
