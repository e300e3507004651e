/*!
 * Dictionary gateway over the external vocabulary store.
 *
 * The store holds one mapping `CanonicalWord -> DictionaryRecord` plus a
 * feature-enabled flag. The gateway is the only way the engine touches it:
 *
 * - `load_snapshot` returns an immutable copy of the whole mapping, or an
 *   empty one when the store fails or the context is gone.
 * - `save` / `remove` read the full mapping, change one entry and write the
 *   full mapping back. Concurrent calls are last-writer-wins.
 *
 * Nothing here returns an error to the caller; failures are logged.
 */

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::context::ExecutionContext;
use crate::errors::StoreError;
use crate::text::CanonicalWord;

pub mod memory;
pub mod sqlite;

pub use self::memory::MemoryStore;
pub use self::sqlite::SqliteStore;

/// One saved vocabulary entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryRecord {
    /// Translation captured when the word was saved
    pub translation: String,
    /// Milliseconds since the Unix epoch
    #[serde(rename = "added", alias = "addedAt")]
    pub added_at: i64,
}

/// The persisted mapping
pub type DictionaryMap = BTreeMap<CanonicalWord, DictionaryRecord>;

/// Immutable view of the dictionary taken once per annotation pass
#[derive(Debug, Clone, Default)]
pub struct DictionarySnapshot {
    entries: Arc<DictionaryMap>,
}

impl DictionarySnapshot {
    /// Wrap a mapping read from the store
    pub fn new(entries: DictionaryMap) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Whether the word is saved
    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    /// Look up a saved record
    pub fn get(&self, word: &str) -> Option<&DictionaryRecord> {
        self.entries.get(word)
    }

    /// Number of saved words
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is saved
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalWord, &DictionaryRecord)> {
        self.entries.iter()
    }
}

/// External key/value store holding the dictionary and the enabled flag
#[async_trait]
pub trait DictionaryStore: Send + Sync + Debug {
    /// Read the full mapping
    async fn get_all(&self) -> Result<DictionaryMap, StoreError>;

    /// Replace the full mapping
    async fn set_all(&self, entries: DictionaryMap) -> Result<(), StoreError>;

    /// Read the feature flag
    async fn get_enabled(&self) -> Result<bool, StoreError>;

    /// Write the feature flag and notify subscribers
    async fn set_enabled(&self, enabled: bool) -> Result<(), StoreError>;

    /// Change notifications for the feature flag
    fn subscribe_enabled(&self) -> watch::Receiver<bool>;
}

/// Facade the engine uses to read and mutate the vocabulary
#[derive(Debug, Clone)]
pub struct DictionaryGateway {
    store: Arc<dyn DictionaryStore>,
    context: ExecutionContext,
}

impl DictionaryGateway {
    /// Create a gateway over a store
    pub fn new(store: Arc<dyn DictionaryStore>, context: ExecutionContext) -> Self {
        Self { store, context }
    }

    /// Load the whole mapping; empty on any failure
    pub async fn load_snapshot(&self) -> DictionarySnapshot {
        if !self.context.is_valid() {
            warn!("Context invalid, returning empty dictionary");
            return DictionarySnapshot::default();
        }

        let result = self.store.get_all().await;

        if !self.context.is_valid() {
            warn!("Context invalidated during dictionary load, returning empty dictionary");
            return DictionarySnapshot::default();
        }

        match result {
            Ok(entries) => {
                debug!("Loaded dictionary snapshot with {} words", entries.len());
                DictionarySnapshot::new(entries)
            }
            Err(StoreError::ContextInvalidated) => {
                warn!("Store reports invalid context, returning empty dictionary");
                DictionarySnapshot::default()
            }
            Err(e) => {
                error!("Storage error: {}", e);
                DictionarySnapshot::default()
            }
        }
    }

    /// Merge one entry into the stored mapping, stamped with the current time.
    ///
    /// Returns whether the write was committed.
    pub async fn save(&self, word: &CanonicalWord, translation: &str) -> bool {
        if !word.is_actionable() {
            return false;
        }
        if !self.context.is_valid() {
            warn!("Context invalid, cannot save word");
            return false;
        }

        let mut entries = match self.store.get_all().await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Storage error: {}", e);
                return false;
            }
        };
        if !self.context.is_valid() {
            warn!("Context invalidated before saving '{}'", word);
            return false;
        }

        entries.insert(
            word.clone(),
            DictionaryRecord {
                translation: translation.to_string(),
                added_at: chrono::Utc::now().timestamp_millis(),
            },
        );

        match self.store.set_all(entries).await {
            Ok(()) => {
                debug!("Saved '{}' to dictionary", word);
                true
            }
            Err(e) => {
                error!("Storage error on set: {}", e);
                false
            }
        }
    }

    /// Delete one entry if present. Returns whether a write was committed.
    pub async fn remove(&self, word: &CanonicalWord) -> bool {
        if !word.is_actionable() {
            return false;
        }
        if !self.context.is_valid() {
            warn!("Context invalid, cannot remove word");
            return false;
        }

        let mut entries = match self.store.get_all().await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Storage error: {}", e);
                return false;
            }
        };
        if !self.context.is_valid() {
            warn!("Context invalidated before removing '{}'", word);
            return false;
        }

        if entries.remove(word.as_str()).is_none() {
            return false;
        }

        match self.store.set_all(entries).await {
            Ok(()) => {
                debug!("Removed '{}' from dictionary", word);
                true
            }
            Err(e) => {
                error!("Storage error on set: {}", e);
                false
            }
        }
    }

    /// Read the feature flag; disabled on failure
    pub async fn is_enabled(&self) -> bool {
        if !self.context.is_valid() {
            return false;
        }
        match self.store.get_enabled().await {
            Ok(enabled) => enabled,
            Err(e) => {
                error!("Storage error reading enabled flag: {}", e);
                false
            }
        }
    }

    /// Persist the feature flag
    pub async fn set_enabled(&self, enabled: bool) -> bool {
        if !self.context.is_valid() {
            warn!("Context invalid, cannot change enabled flag");
            return false;
        }
        match self.store.set_enabled(enabled).await {
            Ok(()) => true,
            Err(e) => {
                error!("Storage error writing enabled flag: {}", e);
                false
            }
        }
    }

    /// Change notifications for the feature flag
    pub fn subscribe_enabled(&self) -> watch::Receiver<bool> {
        self.store.subscribe_enabled()
    }
}

/// Render the mapping as an Anki import file (`Front,Back`)
pub fn export_csv(snapshot: &DictionarySnapshot) -> String {
    let mut csv = String::from("Front,Back\n");
    for (word, record) in snapshot.iter() {
        csv.push_str(&format!("{},{}\n", csv_field(word.as_ref()), csv_field(&record.translation)));
    }
    csv
}

/// Quote a field per RFC 4180 when it holds a separator, a quote or a line break
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
