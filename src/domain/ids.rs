use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

/// Sentinel used by callers to ask for a fresh, not yet persisted document.
pub const NEW_DOCUMENT: &str = "NEW";

/// Identity of a document. `New` never collides with a backend-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum DocumentId {
    #[default]
    New,
    Persisted(String),
}

impl DocumentId {
    /// Interpret a caller-supplied id. The sentinel and the empty string both mean "new".
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == NEW_DOCUMENT {
            DocumentId::New
        } else {
            DocumentId::Persisted(trimmed.to_string())
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, DocumentId::New)
    }

    pub fn as_persisted(&self) -> Option<&str> {
        match self {
            DocumentId::New => None,
            DocumentId::Persisted(id) => Some(id),
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::New => f.write_str(NEW_DOCUMENT),
            DocumentId::Persisted(id) => f.write_str(id),
        }
    }
}

impl From<&str> for DocumentId {
    fn from(raw: &str) -> Self {
        DocumentId::parse(raw)
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DocumentId::New => serializer.serialize_none(),
            DocumentId::Persisted(id) => serializer.serialize_str(id),
        }
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(DocumentId::New),
            Value::String(raw) => Ok(DocumentId::parse(&raw)),
            Value::Number(num) => Ok(DocumentId::Persisted(num.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "document id must be a string or number, got {other}"
            ))),
        }
    }
}

/// Session-local handle for one list entry. Never serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryKey(Uuid);

impl EntryKey {
    pub fn fresh() -> Self {
        EntryKey(Uuid::new_v4())
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sentinel_and_blank_parse_as_new() {
        assert!(DocumentId::parse("NEW").is_new());
        assert!(DocumentId::parse("  ").is_new());
        assert_eq!(DocumentId::parse("42"), DocumentId::Persisted("42".into()));
    }

    #[test]
    fn new_serializes_as_null_and_numbers_deserialize_as_ids() {
        assert_eq!(serde_json::to_value(DocumentId::New).unwrap(), Value::Null);
        let id: DocumentId = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(id.as_persisted(), Some("42"));
        let sentinel: DocumentId = serde_json::from_value(json!("NEW")).unwrap();
        assert!(sentinel.is_new());
        assert!(serde_json::from_value::<DocumentId>(json!(true)).is_err());
    }

    #[test]
    fn entry_keys_are_unique() {
        assert_ne!(EntryKey::fresh(), EntryKey::fresh());
    }
}
