//! Session middleware configuration.
//!
//! Sets up in-memory sessions using tower-sessions. The session is also the
//! shopper's cart storage: [`SessionStorage`] exposes it to the cart engine
//! as a [`CartStorage`].

use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::cart::{CartStorage, StorageError};
use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "gaojie_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    let store = MemoryStore::default();

    // Determine if we're in production (HTTPS)
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// The shopper's session as cart storage.
///
/// Entries are stored as JSON strings so the persisted shape matches the
/// documented `gaojie_cart` / `gaojie_promo` formats.
#[derive(Clone)]
pub struct SessionStorage(pub Session);

fn unavailable(e: tower_sessions::session::Error) -> StorageError {
    StorageError::Unavailable(e.to_string())
}

impl CartStorage for SessionStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.get::<String>(key).await.map_err(unavailable)
    }

    async fn write(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.0.insert(key, value).await.map_err(unavailable)
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.0.remove_value(key).await.map_err(unavailable)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::keys;
    use std::sync::Arc;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_session_storage_roundtrip() {
        let storage = SessionStorage(session());
        assert_eq!(storage.read(keys::CART).await.unwrap(), None);

        storage
            .write(keys::CART, r#"[{"id":"1"}]"#.to_string())
            .await
            .unwrap();
        assert_eq!(
            storage.read(keys::CART).await.unwrap().as_deref(),
            Some(r#"[{"id":"1"}]"#)
        );

        storage.remove(keys::CART).await.unwrap();
        assert_eq!(storage.read(keys::CART).await.unwrap(), None);
    }
}
