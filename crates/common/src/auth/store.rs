//! Token persistence on top of [`KeyValueStore`]
//!
//! The durable store holds the serialized `TokenSet` under
//! [`TOKEN_SET_KEY`]; the session store holds the in-flight PKCE verifier
//! under [`CODE_VERIFIER_KEY`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use nowplaying_domain::constants::{CODE_VERIFIER_KEY, TOKEN_SET_KEY};
use nowplaying_domain::{NowPlayingError, Result};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::traits::KeyValueStore;
use super::types::TokenSet;

/// In-memory key-value store
///
/// Used as the session store for the verifier and as a fake durable store in
/// tests. Contents vanish with the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Durable token record plus session verifier.
#[derive(Clone)]
pub struct TokenStore {
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    #[must_use]
    pub fn new(durable: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self { durable, session }
    }

    /// Load the persisted token set.
    ///
    /// A record that no longer parses is discarded and reported as absent.
    ///
    /// # Errors
    /// Returns `Storage` if the durable backend fails.
    pub async fn load_tokens(&self) -> Result<Option<TokenSet>> {
        let Some(raw) = self.durable.get(TOKEN_SET_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<TokenSet>(&raw) {
            Ok(tokens) => Ok(Some(tokens)),
            Err(err) => {
                warn!(error = %err, "Discarding unreadable token record");
                self.durable.remove(TOKEN_SET_KEY).await?;
                Ok(None)
            }
        }
    }

    /// # Errors
    /// Returns `Storage` if serialization or the durable backend fails.
    pub async fn save_tokens(&self, tokens: &TokenSet) -> Result<()> {
        let raw = serde_json::to_string(tokens)
            .map_err(|e| NowPlayingError::Storage(format!("Failed to serialize tokens: {e}")))?;
        self.durable.set(TOKEN_SET_KEY, &raw).await?;
        debug!("Token set persisted");
        Ok(())
    }

    /// # Errors
    /// Returns `Storage` if the durable backend fails.
    pub async fn clear_tokens(&self) -> Result<()> {
        self.durable.remove(TOKEN_SET_KEY).await
    }

    /// Remember the verifier for the login in progress, replacing any older
    /// one.
    ///
    /// # Errors
    /// Returns `Storage` if the session backend fails.
    pub async fn save_verifier(&self, verifier: &str) -> Result<()> {
        self.session.set(CODE_VERIFIER_KEY, verifier).await
    }

    /// Read and delete the pending verifier.
    ///
    /// # Errors
    /// Returns `Storage` if the session backend fails.
    pub async fn take_verifier(&self) -> Result<Option<String>> {
        let verifier = self.session.get(CODE_VERIFIER_KEY).await?;
        if verifier.is_some() {
            self.session.remove(CODE_VERIFIER_KEY).await?;
        }
        Ok(verifier)
    }

    /// Whether a login is awaiting its callback.
    ///
    /// # Errors
    /// Returns `Storage` if the session backend fails.
    pub async fn has_verifier(&self) -> Result<bool> {
        Ok(self.session.get(CODE_VERIFIER_KEY).await?.is_some())
    }

    /// # Errors
    /// Returns `Storage` if the session backend fails.
    pub async fn clear_verifier(&self) -> Result<()> {
        self.session.remove(CODE_VERIFIER_KEY).await
    }

    /// Remove the durable record and the verifier.
    ///
    /// Both removals are attempted; the first failure is returned.
    ///
    /// # Errors
    /// Returns `Storage` if either backend fails.
    pub async fn clear_all(&self) -> Result<()> {
        let tokens = self.clear_tokens().await;
        let verifier = self.clear_verifier().await;
        tokens.and(verifier)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::store.
    use super::*;

    fn stores() -> (MemoryStore, MemoryStore, TokenStore) {
        let durable = MemoryStore::new();
        let session = MemoryStore::new();
        let store = TokenStore::new(Arc::new(durable.clone()), Arc::new(session.clone()));
        (durable, session, store)
    }

    #[tokio::test]
    async fn test_tokens_round_trip_through_durable_store() {
        let (durable, session, store) = stores();
        let tokens = TokenSet::new("AT1".to_string(), Some("RT1".to_string()), 3600, None);

        store.save_tokens(&tokens).await.unwrap();

        assert_eq!(store.load_tokens().await.unwrap(), Some(tokens));
        assert!(durable.get(TOKEN_SET_KEY).await.unwrap().is_some());
        assert!(session.is_empty().await);
    }

    #[tokio::test]
    async fn test_take_verifier_consumes_it() {
        let (_, session, store) = stores();

        store.save_verifier("first").await.unwrap();
        store.save_verifier("second").await.unwrap();
        assert!(store.has_verifier().await.unwrap());

        assert_eq!(store.take_verifier().await.unwrap().as_deref(), Some("second"));
        assert_eq!(store.take_verifier().await.unwrap(), None);
        assert!(session.is_empty().await);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_discarded() {
        let (durable, _, store) = stores();
        durable.set(TOKEN_SET_KEY, "{not json").await.unwrap();

        assert_eq!(store.load_tokens().await.unwrap(), None);
        assert!(durable.is_empty().await);
    }

    #[tokio::test]
    async fn test_clear_all_empties_both_stores() {
        let (durable, session, store) = stores();
        store
            .save_tokens(&TokenSet::new("AT1".to_string(), None, 3600, None))
            .await
            .unwrap();
        store.save_verifier("V1").await.unwrap();

        store.clear_all().await.unwrap();

        assert!(durable.is_empty().await);
        assert!(session.is_empty().await);
    }
}
