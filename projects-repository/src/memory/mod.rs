//! In-memory hash store for testing and local development.
//!
//! # Example
//!
//! ```ignore
//! use projects_repository::{HashStore, MockHashStore};
//!
//! let store = MockHashStore::new();
//! store.set("projects", "id-1", "{}").await?;
//! assert_eq!(store.get("projects", "id-1").await?, Some("{}".to_string()));
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::interfaces::HashStore;

/// In-memory storage backend.
///
/// Each namespace keeps its entries in first-insertion order, matching the
/// ordering contract of [`HashStore::get_all`].
pub struct MockHashStore {
    namespaces: RwLock<HashMap<String, Vec<(String, String)>>>,
    writes: AtomicUsize,
    fail_removes: AtomicBool,
}

impl MockHashStore {
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(HashMap::new()),
            writes: AtomicUsize::new(0),
            fail_removes: AtomicBool::new(false),
        }
    }

    /// Number of successful `set` and `remove` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent `remove` fail with [`StoreError::Unavailable`].
    pub fn set_fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }

    /// Number of entries in a namespace.
    pub fn len(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .unwrap()
            .get(namespace)
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace) == 0
    }
}

impl Default for MockHashStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HashStore for MockHashStore {
    async fn get_all(&self, namespace: &str) -> Result<Vec<(String, String)>, StoreError> {
        let namespaces = self.namespaces.read().unwrap();
        Ok(namespaces.get(namespace).cloned().unwrap_or_default())
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError> {
        let namespaces = self.namespaces.read().unwrap();
        Ok(namespaces.get(namespace).and_then(|entries| {
            entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }))
    }

    async fn set(&self, namespace: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let mut namespaces = self.namespaces.write().unwrap();
        let entries = namespaces.entry(namespace.to_string()).or_default();
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value.to_string(),
            None => entries.push((key.to_string(), value.to_string())),
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, namespace: &str, key: &str) -> Result<bool, StoreError> {
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("remove {}/{}", namespace, key)));
        }
        let mut namespaces = self.namespaces.write().unwrap();
        let Some(entries) = namespaces.get_mut(namespace) else {
            return Ok(false);
        };
        let before = entries.len();
        entries.retain(|(k, _)| k != key);
        let removed = entries.len() != before;
        if removed {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(removed)
    }
}
