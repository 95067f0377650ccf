//! Hash store trait definition.

use async_trait::async_trait;

use crate::errors::StoreError;

/// A key-value store with hash-map semantics over named namespaces.
///
/// Values are opaque strings; callers own their encoding. Implementations are
/// injected into `ProjectRepository` and the proposal book so tests can run
/// against the in-memory backend.
///
/// # Ordering
///
/// `get_all` returns entries in the order their keys were first written.
/// Overwriting a key keeps its original position. Search ranking relies on this
/// order to break ties deterministically.
#[async_trait]
pub trait HashStore: Send + Sync {
    /// Every `(key, value)` entry in the namespace.
    async fn get_all(&self, namespace: &str) -> Result<Vec<(String, String)>, StoreError>;

    /// The value stored under `key`, if any.
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite the value under `key`.
    async fn set(&self, namespace: &str, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Returns whether an entry existed.
    async fn remove(&self, namespace: &str, key: &str) -> Result<bool, StoreError>;
}
