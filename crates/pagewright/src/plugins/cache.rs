//! Keyed lazy cache for loaded models.
//!
//! A model is initialized on first request for its key and shared read-only after
//! that. The cache is an ordinary value owned by the caller, so tests and parallel
//! pipelines never share hidden state.

use crate::text::WordDictionary;
use crate::{PagewrightError, Result};
use ahash::AHashMap;
use parking_lot::RwLock;
use std::any::Any;
use std::path::Path;
use std::sync::Arc;

type Entry = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct ModelCache {
    entries: RwLock<AHashMap<String, Entry>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the model stored under `key`, initializing it with `init` on first use.
    ///
    /// `init` runs at most once per key, under the write lock. A failed `init` caches
    /// nothing, so the next call retries. Asking for a different type than the one
    /// stored under `key` is a `Validation` error.
    pub fn get_or_init<T, F>(&self, key: &str, init: F) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T>,
    {
        if let Some(entry) = self.entries.read().get(key) {
            return downcast(key, Arc::clone(entry));
        }

        let mut entries = self.entries.write();
        if let Some(entry) = entries.get(key) {
            return downcast(key, Arc::clone(entry));
        }

        tracing::debug!(key, "initializing model");
        let model = Arc::new(init()?);
        entries.insert(key.to_string(), Arc::clone(&model) as Entry);
        Ok(model)
    }

    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<T>> {
        let entry = Arc::clone(self.entries.read().get(key)?);
        entry.downcast::<T>().ok()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Load a word list once per path.
    pub fn word_dictionary(&self, path: impl AsRef<Path>) -> Result<Arc<WordDictionary>> {
        let path = path.as_ref();
        let key = format!("dictionary:{}", path.display());
        self.get_or_init(&key, || WordDictionary::from_file(path))
    }
}

fn downcast<T: Send + Sync + 'static>(key: &str, entry: Entry) -> Result<Arc<T>> {
    entry.downcast::<T>().map_err(|_| {
        PagewrightError::validation(format!(
            "Model cache entry '{}' is not a {}",
            key,
            std::any::type_name::<T>()
        ))
    })
}

impl std::fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.read();
        let mut keys: Vec<&String> = entries.keys().collect();
        keys.sort();
        f.debug_struct("ModelCache").field("keys", &keys).finish()
    }
}
