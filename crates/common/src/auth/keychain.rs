//! Durable key-value storage in the platform keychain.
//!
//! Each key maps to one keyring entry under the configured service name
//! (macOS Keychain, Windows Credential Manager, Linux Secret Service).

use async_trait::async_trait;
use keyring::Entry;
use nowplaying_domain::{NowPlayingError, Result};
use tracing::debug;

use super::traits::KeyValueStore;

/// Keychain-backed [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct KeychainStore {
    service_name: String,
}

impl KeychainStore {
    /// # Examples
    /// ```
    /// use nowplaying_common::auth::KeychainStore;
    ///
    /// let store = KeychainStore::new("NowPlaying.spotify");
    /// assert_eq!(store.service_name(), "NowPlaying.spotify");
    /// ```
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service_name, key).map_err(|e| {
            NowPlayingError::Storage(format!("Failed to create keychain entry: {e}"))
        })
    }
}

#[async_trait]
impl KeyValueStore for KeychainStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        debug!(service = %self.service_name, key = %key, "Reading keychain entry");

        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(NowPlayingError::Storage(format!(
                "Failed to read keychain entry {key}: {e}"
            ))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        debug!(service = %self.service_name, key = %key, "Writing keychain entry");

        self.entry(key)?.set_password(value).map_err(|e| {
            NowPlayingError::Storage(format!("Failed to write keychain entry {key}: {e}"))
        })
    }

    async fn remove(&self, key: &str) -> Result<()> {
        debug!(service = %self.service_name, key = %key, "Deleting keychain entry");

        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(NowPlayingError::Storage(format!(
                "Failed to delete keychain entry {key}: {e}"
            ))),
        }
    }
}
