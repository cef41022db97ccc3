//! Application context - dependency injection container for the CLI

use std::sync::Arc;

use nowplaying_common::auth::{KeyValueStore, MemoryStore, OAuthService, TokenStore};
use nowplaying_core::{NowPlayingProvider, NowPlayingService};
use nowplaying_domain::{ClientConfig, NowPlayingError, Result, StoreBackend};
use nowplaying_infra::scheduling::{NowPlayingScheduler, NowPlayingSchedulerConfig};
use nowplaying_infra::{FileStore, RelayPlayerClient, RelayTokenClient};
use tracing::{debug, info};

/// Keychain service name for the durable token record.
pub const KEYCHAIN_SERVICE: &str = "NowPlaying.spotify";

/// Type alias for the player port trait object
type DynNowPlayingProvider = dyn NowPlayingProvider + Send + Sync + 'static;

/// Client context - holds the login orchestrator and the playback client
pub struct AppContext {
    pub config: ClientConfig,
    pub oauth: Arc<OAuthService<RelayTokenClient>>,
    pub player: Arc<DynNowPlayingProvider>,
    /// Human-readable location of the durable token record.
    pub durable_location: String,
}

impl AppContext {
    /// Build the context with the durable store named by `config.store`.
    ///
    /// # Errors
    /// - `Config` when the keychain backend is requested but not compiled in
    /// - `Config` when the relay URL is invalid
    /// - `Storage` when persisted tokens cannot be read
    pub async fn new(config: ClientConfig) -> Result<Self> {
        let (durable, location) = durable_store(&config)?;
        Self::with_durable_store(config, durable, location).await
    }

    /// Build the context over an explicit durable store.
    ///
    /// # Errors
    /// See [`AppContext::new`].
    pub async fn with_durable_store(
        config: ClientConfig,
        durable: Arc<dyn KeyValueStore>,
        durable_location: impl Into<String>,
    ) -> Result<Self> {
        // Session store lives only as long as this process.
        let store = TokenStore::new(durable, Arc::new(MemoryStore::new()));

        let exchanger = Arc::new(RelayTokenClient::new(&config.relay_url)?);
        let oauth = Arc::new(OAuthService::new(
            config.relay_url.clone(),
            exchanger,
            store,
            config.refresh_threshold_seconds,
        ));
        let restored = oauth.initialize().await.map_err(NowPlayingError::from)?;
        debug!(restored, "Token manager initialized");

        let player: Arc<DynNowPlayingProvider> =
            Arc::new(RelayPlayerClient::new(&config.relay_url)?);

        let durable_location = durable_location.into();
        info!(relay_url = %config.relay_url, store = %config.store, "Client context ready");

        Ok(Self { config, oauth, player, durable_location })
    }

    /// Poll step over this context's token manager and player.
    pub fn now_playing_service(&self) -> Arc<NowPlayingService> {
        Arc::new(NowPlayingService::new(self.oauth.token_manager(), self.player.clone()))
    }

    /// Scheduler polling at the configured interval.
    pub fn scheduler(&self) -> NowPlayingScheduler {
        NowPlayingScheduler::new(
            self.now_playing_service(),
            NowPlayingSchedulerConfig::with_interval_secs(self.config.poll_interval_seconds),
        )
    }
}

fn durable_store(config: &ClientConfig) -> Result<(Arc<dyn KeyValueStore>, String)> {
    match config.store {
        StoreBackend::File => {
            let store = FileStore::in_dir(config.data_dir.as_deref());
            let location = store.path().display().to_string();
            Ok((Arc::new(store), location))
        }
        StoreBackend::Keychain => keychain_store(),
    }
}

#[cfg(feature = "keychain")]
fn keychain_store() -> Result<(Arc<dyn KeyValueStore>, String)> {
    let store = nowplaying_common::auth::KeychainStore::new(KEYCHAIN_SERVICE);
    Ok((Arc::new(store), format!("keychain:{KEYCHAIN_SERVICE}")))
}

#[cfg(not(feature = "keychain"))]
fn keychain_store() -> Result<(Arc<dyn KeyValueStore>, String)> {
    Err(NowPlayingError::Config(
        "keychain storage requires the `keychain` feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use nowplaying_common::auth::TokenSet;
    use nowplaying_domain::constants::TOKEN_SET_KEY;
    use nowplaying_domain::LifecycleState;
    use tempfile::TempDir;

    use super::*;

    fn config_in(dir: &TempDir) -> ClientConfig {
        ClientConfig {
            data_dir: Some(dir.path().display().to_string()),
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn file_backend_points_at_data_dir() {
        let dir = TempDir::new().unwrap();
        let ctx = AppContext::new(config_in(&dir)).await.unwrap();

        assert!(ctx.durable_location.starts_with(&dir.path().display().to_string()));
        assert_eq!(ctx.oauth.token_manager().state(), LifecycleState::Unauthenticated);
    }

    #[tokio::test]
    async fn restores_persisted_tokens() {
        let durable = Arc::new(MemoryStore::new());
        let tokens = TokenSet::new("AT".to_string(), Some("RT".to_string()), 3600, None);
        durable.set(TOKEN_SET_KEY, &serde_json::to_string(&tokens).unwrap()).await.unwrap();

        let ctx = AppContext::with_durable_store(ClientConfig::default(), durable, "memory")
            .await
            .unwrap();

        assert_eq!(ctx.oauth.token_manager().state(), LifecycleState::Valid);
        assert!(!ctx.oauth.has_pending_login().await.unwrap());
    }

    #[tokio::test]
    async fn rejects_invalid_relay_url() {
        let config = ClientConfig { relay_url: "not a url".to_string(), ..ClientConfig::default() };
        let result =
            AppContext::with_durable_store(config, Arc::new(MemoryStore::new()), "memory").await;

        assert!(matches!(result, Err(NowPlayingError::Config(_))));
    }

    #[cfg(not(feature = "keychain"))]
    #[tokio::test]
    async fn keychain_backend_requires_feature() {
        let config = ClientConfig { store: StoreBackend::Keychain, ..ClientConfig::default() };
        assert!(matches!(AppContext::new(config).await, Err(NowPlayingError::Config(_))));
    }
}
