//! The state persistence capability.

use async_trait::async_trait;
use dashmap::DashMap;

/// Error type for state storage operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StateError {
    /// The storage backend failed to serve the request.
    #[error("state backend: {0}")]
    Backend(String),

    /// A stored value could not be serialized or deserialized.
    #[error("state serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StateError {
    /// Create a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Key/value persistence port for session state.
///
/// Implementations namespace keys by session on their side; the engine
/// only supplies the key suffixes defined in [`crate::keys`].
///
/// Absence is `Ok(None)`, distinct from `Err`. The engine swallows read
/// errors in its query surface (treating them as absence) but propagates
/// write errors, so implementations should reserve `Err` for genuine
/// backend failures.
///
/// Operations are individually atomic; nothing transactional is assumed
/// across keys.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StateError>;

    /// Store `value` under `key`, overwriting any previous value.
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StateError>;
}

/// In-memory [`StateStore`] for tests and embedded hosts.
///
/// Backed by a [`DashMap`], so concurrent action tasks can read and write
/// without an outer lock.
#[derive(Debug, Default)]
pub struct MemoryState {
    entries: DashMap<String, serde_json::Value>,
}

impl MemoryState {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value synchronously. Useful for rehydration tests.
    pub fn insert(&self, key: impl Into<String>, value: serde_json::Value) {
        self.entries.insert(key.into(), value);
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot the current contents, for assertions.
    #[must_use]
    pub fn snapshot(&self) -> std::collections::HashMap<String, serde_json::Value> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }
}

#[async_trait]
impl StateStore for MemoryState {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StateError> {
        Ok(self.entries.get(key).map(|e| e.value().clone()))
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StateError> {
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }
}
