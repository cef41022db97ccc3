//! Port interfaces for now-playing polling
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use nowplaying_common::auth::{TokenExchanger, TokenManager};
use nowplaying_domain::{LifecycleState, Result, Track};
use tokio::sync::watch;

/// Trait for fetching the user's currently-playing item
#[async_trait]
pub trait NowPlayingProvider: Send + Sync {
    /// Fetch the current track
    ///
    /// `Ok(None)` when nothing is playing (HTTP 204, empty body, or no item).
    /// A rejected token must surface as `NowPlayingError::Unauthorized`.
    async fn currently_playing(&self, access_token: &str) -> Result<Option<Track>>;
}

/// Trait for obtaining a usable access token right before a protected call
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// Validate-or-refresh, then return the access token.
    async fn access_token(&self) -> Result<String>;

    /// Tear down after the protected resource rejected the token.
    async fn invalidate(&self) -> Result<()>;

    /// Lifecycle transitions.
    fn subscribe(&self) -> watch::Receiver<LifecycleState>;
}

#[async_trait]
impl<C: TokenExchanger + 'static> AccessTokenSource for TokenManager<C> {
    async fn access_token(&self) -> Result<String> {
        TokenManager::access_token(self).await.map_err(Into::into)
    }

    async fn invalidate(&self) -> Result<()> {
        TokenManager::invalidate(self).await.map_err(Into::into)
    }

    fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        TokenManager::subscribe(self)
    }
}
