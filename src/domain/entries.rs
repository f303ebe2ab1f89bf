use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::ids::EntryKey;

/// One element of a list-valued document field. The content is opaque to the session;
/// the key is assigned when the entry enters the session and is never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionEntry {
    key: EntryKey,
    content: Value,
}

impl CollectionEntry {
    pub fn new(content: Value) -> Self {
        Self {
            key: EntryKey::fresh(),
            content,
        }
    }

    pub fn key(&self) -> EntryKey {
        self.key
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut Value {
        &mut self.content
    }

    pub fn into_content(self) -> Value {
        self.content
    }

    /// Text field of an object entry, if present.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.content.get(field).and_then(Value::as_str)
    }
}

impl Serialize for CollectionEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.content.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CollectionEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(CollectionEntry::new)
    }
}

/// A list-valued document field. An absent list is distinct from an empty one so that
/// untouched documents round-trip unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryList(Option<Vec<CollectionEntry>>);

impl EntryList {
    pub fn empty() -> Self {
        EntryList(Some(Vec::new()))
    }

    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        EntryList(Some(values.into_iter().map(CollectionEntry::new).collect()))
    }

    pub fn is_absent(&self) -> bool {
        self.0.is_none()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn entries(&self) -> &[CollectionEntry] {
        self.0.as_deref().unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollectionEntry> {
        self.entries().iter()
    }

    pub fn keys(&self) -> Vec<EntryKey> {
        self.iter().map(CollectionEntry::key).collect()
    }

    pub fn contents(&self) -> Vec<Value> {
        self.iter().map(|entry| entry.content.clone()).collect()
    }

    pub fn get(&self, key: EntryKey) -> Option<&CollectionEntry> {
        self.iter().find(|entry| entry.key == key)
    }

    pub fn get_mut(&mut self, key: EntryKey) -> Option<&mut CollectionEntry> {
        self.0.as_mut()?.iter_mut().find(|entry| entry.key == key)
    }

    pub fn position(&self, key: EntryKey) -> Option<usize> {
        self.iter().position(|entry| entry.key == key)
    }

    pub fn find_by_text(&self, field: &str, needle: &str) -> Option<&CollectionEntry> {
        self.iter().find(|entry| entry.text(field) == Some(needle))
    }

    /// Append, creating the list if it was absent.
    pub fn push(&mut self, content: Value) -> EntryKey {
        let entry = CollectionEntry::new(content);
        let key = entry.key;
        self.0.get_or_insert_with(Vec::new).push(entry);
        key
    }

    /// Remove the first entry carrying `key`. A missing key is not an error.
    pub fn remove(&mut self, key: EntryKey) -> Option<CollectionEntry> {
        let list = self.0.as_mut()?;
        let idx = list.iter().position(|entry| entry.key == key)?;
        Some(list.remove(idx))
    }

    pub fn replace(&mut self, key: EntryKey, content: Value) -> bool {
        match self.get_mut(key) {
            Some(entry) => {
                entry.content = content;
                true
            }
            None => false,
        }
    }

    /// Replace every entry whose `field` equals the same field of `content`.
    /// Returns the keys of the replaced entries; an entry keeps its key.
    pub fn replace_matching(&mut self, field: &str, content: &Value) -> Vec<EntryKey> {
        let Some(needle) = content.get(field) else {
            return Vec::new();
        };
        let Some(list) = self.0.as_mut() else {
            return Vec::new();
        };
        let mut replaced = Vec::new();
        for entry in list.iter_mut() {
            if entry.content.get(field) == Some(needle) {
                entry.content = content.clone();
                replaced.push(entry.key);
            }
        }
        replaced
    }

    /// Move the entry at `from` to `to`, shifting the ones in between. Both indices are
    /// clamped into range. Returns `true` when the order changed.
    pub fn relocate(&mut self, from: usize, to: usize) -> bool {
        let Some(list) = self.0.as_mut() else {
            return false;
        };
        if list.is_empty() {
            return false;
        }
        let last = list.len() - 1;
        let from = from.min(last);
        let to = to.min(last);
        if from == to {
            return false;
        }
        let entry = list.remove(from);
        list.insert(to, entry);
        true
    }
}

impl Serialize for EntryList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EntryList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<Vec<CollectionEntry>>::deserialize(deserializer).map(EntryList)
    }
}
