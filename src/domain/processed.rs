//! Persisted set of already classified asset identifiers.
//!
//! Every change is written through to the store before it is visible, so an
//! abrupt exit never loses a recorded classification.

use super::AssetId;
use crate::error::{Result, SwipeError};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Key under which the processed identifiers live in the state document
pub const PROCESSED_KEY: &str = "processedPhotos";

/// Durable storage for the processed set
pub trait ProcessedStore: Send + Sync {
    fn load(&self) -> Result<HashSet<AssetId>>;
    fn save(&self, ids: &HashSet<AssetId>) -> Result<()>;
}

/// JSON key-value document on disk; keys other than [`PROCESSED_KEY`] are preserved
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the default state file path (~/.local/share/photoswipe/state.json)
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("photoswipe").join("state.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&contents)? {
            Value::Object(map) => Ok(map),
            _ => Err(SwipeError::ConfigError(format!(
                "state file {} is not a JSON object",
                self.path.display()
            ))),
        }
    }
}

impl ProcessedStore for JsonFileStore {
    fn load(&self) -> Result<HashSet<AssetId>> {
        let document = self.read_document()?;
        match document.get(PROCESSED_KEY) {
            None | Some(Value::Null) => Ok(HashSet::new()),
            Some(value) => Ok(serde_json::from_value::<Vec<AssetId>>(value.clone())?
                .into_iter()
                .collect()),
        }
    }

    fn save(&self, ids: &HashSet<AssetId>) -> Result<()> {
        let mut document = match self.read_document() {
            Ok(document) => document,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "replacing unreadable state file");
                Map::new()
            }
        };

        let mut sorted: Vec<&AssetId> = ids.iter().collect();
        sorted.sort();
        document.insert(PROCESSED_KEY.to_string(), serde_json::to_value(sorted)?);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write to a sibling and rename so a crash never leaves a torn file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&Value::Object(document))?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-process store for tests and embedders that persist elsewhere
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Arc<Mutex<HashSet<AssetId>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(ids: impl IntoIterator<Item = AssetId>) -> Self {
        let store = Self::default();
        *store.saved.lock().unwrap_or_else(|e| e.into_inner()) = ids.into_iter().collect();
        store
    }

    /// Makes subsequent saves fail, simulating a full disk
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap_or_else(|e| e.into_inner()) = fail;
    }

    /// Snapshot of what was last persisted
    pub fn saved(&self) -> HashSet<AssetId> {
        self.saved.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ProcessedStore for MemoryStore {
    fn load(&self) -> Result<HashSet<AssetId>> {
        Ok(self.saved())
    }

    fn save(&self, ids: &HashSet<AssetId>) -> Result<()> {
        if *self.fail_writes.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(SwipeError::Io(std::io::Error::other("simulated write failure")));
        }
        *self.saved.lock().unwrap_or_else(|e| e.into_inner()) = ids.clone();
        Ok(())
    }
}

/// The processed set with write-then-persist discipline.
///
/// A failed write rolls the in-memory change back.
pub struct ProcessedSet {
    ids: HashSet<AssetId>,
    store: Box<dyn ProcessedStore>,
}

impl std::fmt::Debug for ProcessedSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessedSet").field("ids", &self.ids).finish()
    }
}

impl ProcessedSet {
    pub fn open(store: Box<dyn ProcessedStore>) -> Result<Self> {
        let ids = store.load()?;
        Ok(Self { ids, store })
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> &HashSet<AssetId> {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Inserts and persists. Returns false if the id was already present.
    pub fn insert(&mut self, id: AssetId) -> Result<bool> {
        if !self.ids.insert(id.clone()) {
            return Ok(false);
        }
        if let Err(e) = self.store.save(&self.ids) {
            self.ids.remove(&id);
            return Err(e);
        }
        Ok(true)
    }

    /// Removes and persists. Returns false if the id was absent.
    pub fn remove(&mut self, id: &AssetId) -> Result<bool> {
        if !self.ids.remove(id) {
            return Ok(false);
        }
        if let Err(e) = self.store.save(&self.ids) {
            self.ids.insert(id.clone());
            return Err(e);
        }
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<()> {
        let previous = std::mem::take(&mut self.ids);
        if let Err(e) = self.store.save(&self.ids) {
            self.ids = previous;
            return Err(e);
        }
        Ok(())
    }
}
