//! Key/value persistence for cart state.
//!
//! The shopper's cart lives in string-valued entries under fixed keys, the
//! same shape a browser's local storage would hold. Production handlers use
//! the session-backed store in [`crate::middleware::session`]; tests and
//! degraded paths use [`MemoryStorage`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Storage keys.
pub mod keys {
    /// JSON array of cart lines.
    pub const CART: &str = "gaojie_cart";

    /// Active promo as `{code, discount}`.
    pub const PROMO: &str = "gaojie_promo";

    /// Checkout step and entered form values.
    pub const CHECKOUT: &str = "gaojie_checkout";
}

/// Errors raised by a [`CartStorage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Async key/value capability the cart engine is built over.
pub trait CartStorage: Send + Sync {
    /// Read a raw entry. `Ok(None)` when the key is absent.
    fn read(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Replace an entry.
    fn write(&self, key: &str, value: String) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Delete an entry. Deleting an absent key succeeds.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// In-memory storage shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry directly, bypassing the cart engine.
    pub fn insert_raw(&self, key: &str, value: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.into());
        }
    }

    /// Read an entry directly.
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::Unavailable("memory storage lock poisoned".to_string())
}

impl CartStorage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().map_err(poisoned)?.get(key).cloned())
    }

    async fn write(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries
            .lock()
            .map_err(poisoned)?
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().map_err(poisoned)?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.read(keys::CART).await.unwrap(), None);

        storage.write(keys::CART, "[]".to_string()).await.unwrap();
        assert_eq!(storage.read(keys::CART).await.unwrap().as_deref(), Some("[]"));

        storage.remove(keys::CART).await.unwrap();
        assert_eq!(storage.read(keys::CART).await.unwrap(), None);
        storage.remove(keys::CART).await.unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let storage = MemoryStorage::new();
        let clone = storage.clone();
        clone.insert_raw(keys::PROMO, "{}");
        assert_eq!(storage.get_raw(keys::PROMO).as_deref(), Some("{}"));
    }
}
