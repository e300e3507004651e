/*!
 * In-process dictionary store.
 *
 * Backs tests and the CLI demo surface. Supports simulated latency and
 * injected read/write failures so the gateway's degradation paths and the
 * last-writer-wins behaviour can be exercised.
 */

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use super::{DictionaryMap, DictionaryRecord, DictionaryStore};
use crate::errors::StoreError;
use crate::text::normalize;

/// Dictionary store kept in memory
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<DictionaryMap>,
    enabled: watch::Sender<bool>,
    latency: Option<Duration>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Empty store with the feature enabled
    pub fn new() -> Self {
        let (enabled, _) = watch::channel(true);
        Self {
            entries: Mutex::new(DictionaryMap::new()),
            enabled,
            latency: None,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    /// Delay every store call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Seed an entry directly, bypassing the gateway
    pub fn insert(&self, word: &str, translation: &str) {
        self.entries.lock().insert(
            normalize(word),
            DictionaryRecord {
                translation: translation.to_string(),
                added_at: chrono::Utc::now().timestamp_millis(),
            },
        );
    }

    /// Make reads fail
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make writes fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of committed `set_all` calls
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current contents
    pub fn entries(&self) -> DictionaryMap {
        self.entries.lock().clone()
    }

    /// Number of stored words
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no words are stored
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DictionaryStore for MemoryStore {
    async fn get_all(&self) -> Result<DictionaryMap, StoreError> {
        self.simulate_latency().await;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("simulated read failure".to_string()));
        }
        Ok(self.entries.lock().clone())
    }

    async fn set_all(&self, entries: DictionaryMap) -> Result<(), StoreError> {
        self.simulate_latency().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("simulated write failure".to_string()));
        }
        *self.entries.lock() = entries;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_enabled(&self) -> Result<bool, StoreError> {
        Ok(*self.enabled.borrow())
    }

    async fn set_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        self.enabled.send_replace(enabled);
        Ok(())
    }

    fn subscribe_enabled(&self) -> watch::Receiver<bool> {
        self.enabled.subscribe()
    }
}
