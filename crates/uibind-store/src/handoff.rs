//! Descriptor hand-off between the generating run and the post-recompile
//! binding pass.
//!
//! A committed run publishes the descriptor list and the generated class
//! name; the binding pass consumes them exactly once. Consuming removes the
//! entry so a later recompile cannot replay a stale list.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uibind_types::{FieldDescriptor, HandoffConfig};

use crate::commit::write_atomic;
use crate::error::{StoreError, StoreResult};

/// What one committed run hands to the binding pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffEntry {
    /// Class the descriptors belong to, so the binder can find the object
    /// to attach them to.
    pub class_name: Option<String>,
    pub descriptors: Vec<FieldDescriptor>,
}

impl HandoffEntry {
    pub fn new(descriptors: Vec<FieldDescriptor>) -> Self {
        Self {
            class_name: None,
            descriptors,
        }
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }
}

/// Two-message key/value hand-off.
pub trait HandoffStore: Send + Sync {
    /// Store `entry`, replacing any unconsumed one.
    fn publish_entry(&self, entry: &HandoffEntry) -> StoreResult<()>;

    /// Take the stored entry, removing it.
    ///
    /// Returns `Ok(None)` if nothing was published.
    fn consume_entry(&self) -> StoreResult<Option<HandoffEntry>>;

    /// Store `descriptors` without a class name.
    fn publish(&self, descriptors: &[FieldDescriptor]) -> StoreResult<()> {
        self.publish_entry(&HandoffEntry::new(descriptors.to_vec()))
    }

    /// Take the stored descriptors, dropping the class name.
    fn consume(&self) -> StoreResult<Option<Vec<FieldDescriptor>>> {
        Ok(self.consume_entry()?.map(|entry| entry.descriptors))
    }
}

/// Hand-off kept in a JSON object file shared with other keys.
///
/// The descriptor list and the class name sit under two keys of the same
/// object. Entries under other keys are preserved on every rewrite.
#[derive(Clone, Debug)]
pub struct FileHandoffStore {
    path: PathBuf,
    key: String,
    class_key: String,
}

impl FileHandoffStore {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
            class_key: HandoffConfig::default().class_key,
        }
    }

    pub fn with_class_key(mut self, class_key: impl Into<String>) -> Self {
        self.class_key = class_key.into();
        self
    }

    /// Store at `config.path` resolved against `base` unless absolute.
    pub fn from_config(config: &HandoffConfig, base: &Path) -> Self {
        let path = Path::new(&config.path);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        };
        Self::new(path, config.key.clone()).with_class_key(config.class_key.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn class_key(&self) -> &str {
        &self.class_key
    }

    fn load(&self) -> StoreResult<BTreeMap<String, serde_json::Value>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn save(&self, entries: &BTreeMap<String, serde_json::Value>) -> StoreResult<()> {
        let text = serde_json::to_string_pretty(entries)?;
        write_atomic(&self.path, &text)
    }
}

impl HandoffStore for FileHandoffStore {
    fn publish_entry(&self, entry: &HandoffEntry) -> StoreResult<()> {
        let mut entries = self.load()?;
        let value = serde_json::to_value(&entry.descriptors)?;
        if entries.insert(self.key.clone(), value).is_some() {
            warn!(key = %self.key, "replacing unconsumed hand-off entry");
        }
        match &entry.class_name {
            Some(name) => entries.insert(self.class_key.clone(), name.clone().into()),
            None => entries.remove(&self.class_key),
        };
        self.save(&entries)?;
        debug!(
            key = %self.key,
            class_name = ?entry.class_name,
            count = entry.descriptors.len(),
            "hand-off published"
        );
        Ok(())
    }

    fn consume_entry(&self) -> StoreResult<Option<HandoffEntry>> {
        let mut entries = self.load()?;
        let value = entries.remove(&self.key);
        let class_value = entries.remove(&self.class_key);
        if value.is_none() && class_value.is_none() {
            return Ok(None);
        }
        self.save(&entries)?;

        let Some(value) = value else {
            warn!(key = %self.class_key, "dropping class name without descriptors");
            return Ok(None);
        };
        let descriptors: Vec<FieldDescriptor> =
            serde_json::from_value(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let class_name: Option<String> = class_value
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        debug!(key = %self.key, ?class_name, count = descriptors.len(), "hand-off consumed");
        Ok(Some(HandoffEntry {
            class_name,
            descriptors,
        }))
    }
}

/// In-memory hand-off for tests and embedding.
pub struct InMemoryHandoffStore {
    entry: RwLock<Option<HandoffEntry>>,
}

impl InMemoryHandoffStore {
    pub fn new() -> Self {
        Self {
            entry: RwLock::new(None),
        }
    }

    /// Returns `true` if an unconsumed entry is present.
    pub fn is_pending(&self) -> bool {
        self.entry.read().expect("lock poisoned").is_some()
    }
}

impl Default for InMemoryHandoffStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HandoffStore for InMemoryHandoffStore {
    fn publish_entry(&self, entry: &HandoffEntry) -> StoreResult<()> {
        *self.entry.write().expect("lock poisoned") = Some(entry.clone());
        Ok(())
    }

    fn consume_entry(&self) -> StoreResult<Option<HandoffEntry>> {
        Ok(self.entry.write().expect("lock poisoned").take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptors() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("Play", "Button").with_source(12u64),
            FieldDescriptor::new("Title", "Text").with_source(13u64),
        ]
    }

    #[test]
    fn in_memory_consumes_once() {
        let store = InMemoryHandoffStore::new();
        assert_eq!(store.consume().unwrap(), None);

        store.publish(&descriptors()).unwrap();
        assert!(store.is_pending());
        assert_eq!(store.consume().unwrap(), Some(descriptors()));
        assert_eq!(store.consume().unwrap(), None);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHandoffStore::new(dir.path().join("state").join("handoff.json"), "objDataList");

        assert_eq!(store.consume().unwrap(), None);
        store.publish(&descriptors()).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"objDataList\""));
        assert!(raw.contains("\"type\": \"Button\""));

        assert_eq!(store.consume().unwrap(), Some(descriptors()));
        assert_eq!(store.consume().unwrap(), None);
    }

    #[test]
    fn file_store_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("handoff.json");
        fs::write(&path, r#"{"other": 42}"#).unwrap();

        let store = FileHandoffStore::new(&path, "objDataList");
        store.publish(&descriptors()).unwrap();
        store.consume().unwrap();

        let entries: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries["other"], serde_json::json!(42));
    }

    #[test]
    fn publish_replaces_previous_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHandoffStore::new(dir.path().join("h.json"), "k");
        store.publish(&descriptors()).unwrap();
        store.publish(&descriptors()[..1]).unwrap();
        assert_eq!(store.consume().unwrap().unwrap().len(), 1);
    }

    #[test]
    fn class_name_travels_under_its_own_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("handoff.json");
        let store = FileHandoffStore::new(&path, "objDataList");
        let entry = HandoffEntry::new(descriptors()).with_class_name("StartPanel");
        store.publish_entry(&entry).unwrap();

        let raw: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["GeneratorClassName"], serde_json::json!("StartPanel"));

        assert_eq!(store.consume_entry().unwrap(), Some(entry));
        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("GeneratorClassName"));
        assert_eq!(store.consume_entry().unwrap(), None);
    }

    #[test]
    fn publishing_without_class_name_clears_a_stale_one() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHandoffStore::new(dir.path().join("h.json"), "k").with_class_key("cls");
        store
            .publish_entry(&HandoffEntry::new(descriptors()).with_class_name("OldPanel"))
            .unwrap();
        store.publish(&descriptors()).unwrap();

        let entry = store.consume_entry().unwrap().unwrap();
        assert_eq!(entry.class_name, None);
        assert_eq!(entry.descriptors, descriptors());
    }

    #[test]
    fn lone_class_name_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.json");
        fs::write(&path, r#"{"GeneratorClassName": "StartPanel", "other": 1}"#).unwrap();

        let store = FileHandoffStore::new(&path, "objDataList");
        assert_eq!(store.consume_entry().unwrap(), None);
        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("GeneratorClassName"));
        assert!(raw.contains("other"));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.json");
        fs::write(&path, "not json").unwrap();
        let store = FileHandoffStore::new(&path, "k");
        assert!(matches!(store.consume(), Err(StoreError::Serialization(_))));
    }

    #[test]
    fn relative_config_path_resolves_against_base() {
        let config = HandoffConfig::default();
        let store = FileHandoffStore::from_config(&config, Path::new("/proj"));
        assert_eq!(store.path(), Path::new("/proj/.uibind/handoff.json"));
        assert_eq!(store.key(), "objDataList");
        assert_eq!(store.class_key(), "GeneratorClassName");
    }
}
