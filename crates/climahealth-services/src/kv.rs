//! Key-value persistence backend trait.
//!
//! Every store keeps its records as one JSON blob under a fixed key, so a
//! mutation is a single `set` and either lands completely or not at all.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreResult;

/// Keys used by the stores. Names match data written by earlier versions.
pub mod keys {
    pub const PRIMARY_PROFILE: &str = "healthProfile";
    pub const FAMILY_PROFILES: &str = "familyProfiles";
    pub const ALERT_HISTORY: &str = "alertHistory";
    pub const SYMPTOM_HISTORY: &str = "symptomHistory";
}

/// Trait for key-value storage backends.
///
/// Implementations must be usable from several stores at once, so they take
/// `&self` and handle their own locking.
pub trait KeyValueStore: Send + Sync {
    /// Get the raw value for a key, `None` if unset.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Insert or replace a value.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a key. Removing an unset key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Shared handle to a backend.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Read and decode a JSON value.
///
/// # Errors
/// Returns `StoreError::Serialization` if the stored text is not valid for `T`.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> StoreResult<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Read a JSON array, decoding each element on its own.
///
/// Elements that don't decode as `T` are logged and skipped, so one bad
/// record cannot make the rest of the list unreadable.
///
/// # Errors
/// Returns `StoreError::Serialization` if the stored text is not a JSON array.
pub fn load_json_list<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> StoreResult<Vec<T>> {
    let Some(raw) = load_json::<Vec<serde_json::Value>>(store, key)? else {
        return Ok(Vec::new());
    };

    let mut items = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        match serde_json::from_value(value) {
            Ok(item) => items.push(item),
            Err(e) => tracing::warn!("Skipping unreadable entry {} under {}: {}", index, key, e),
        }
    }
    Ok(items)
}

/// Encode and write a JSON value.
///
/// # Errors
/// Returns `StoreError::Serialization` if encoding fails, or the backend error.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> StoreResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// In-memory backend for tests and the `memory` storage setting.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
