//! Ordered store implementation
//!
//! HashMap + insertion-order Vec behind a single Mutex.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::AddResult;

/// Key-value store that enumerates in first-insertion order
///
/// ## Invariant
/// `order` holds exactly the keys of `entries`, each once, in the order
/// they were first inserted. Overwriting a key leaves its position alone.
#[derive(Debug, Default)]
pub struct OrderedStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, String>,
    order: Vec<String>,
}

impl OrderedStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a key
    pub fn add(&self, key: &str, value: &str) -> AddResult {
        let mut inner = self.inner.lock();

        match inner.entries.insert(key.to_string(), value.to_string()) {
            Some(previous) => AddResult {
                inserted: false,
                previous: Some(previous),
            },
            None => {
                inner.order.push(key.to_string());
                AddResult {
                    inserted: true,
                    previous: None,
                }
            }
        }
    }

    /// Remove a key, returning whether it was present
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();

        if inner.entries.remove(key).is_none() {
            return false;
        }
        if let Some(position) = inner.order.iter().position(|k| k == key) {
            inner.order.remove(position);
        }
        true
    }

    /// Get the current value of a key
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().entries.get(key).cloned()
    }

    /// All entries in insertion order, taken under a single lock acquisition
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let inner = self.inner.lock();

        inner
            .order
            .iter()
            .filter_map(|key| {
                inner
                    .entries
                    .get(key)
                    .map(|value| (key.clone(), value.clone()))
            })
            .collect()
    }

    /// Whether a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
