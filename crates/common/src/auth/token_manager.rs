//! Token lifecycle manager
//!
//! Manages the client-side token lifecycle:
//! - Token retrieval from the durable store
//! - Validate-or-refresh before every protected call
//! - Teardown on 401 from the protected resource
//! - State broadcast over a `watch` channel
//!
//! Refresh is serialized: concurrent callers that find the token expired wait
//! on the refresh lock and re-check, so only one refresh request is issued.

use std::sync::Arc;

use nowplaying_domain::{LifecycleState, NowPlayingError};
use thiserror::Error;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, info, warn};

use super::store::TokenStore;
use super::traits::TokenExchanger;
use super::types::TokenSet;

/// Error type for token manager operations
#[derive(Debug, Error)]
pub enum TokenManagerError {
    /// No usable tokens (never logged in, or torn down)
    #[error("Not authenticated (no tokens)")]
    NotAuthenticated,

    /// Token refresh failed; the token set was torn down
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// Durable or session storage failed
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<NowPlayingError> for TokenManagerError {
    fn from(err: NowPlayingError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<TokenManagerError> for NowPlayingError {
    fn from(err: TokenManagerError) -> Self {
        match err {
            TokenManagerError::NotAuthenticated | TokenManagerError::RefreshFailed(_) => {
                Self::Unauthorized(err.to_string())
            }
            TokenManagerError::Storage(msg) => Self::Storage(msg),
        }
    }
}

/// Token manager with validate-or-refresh semantics
///
/// Single source of truth for the access token: callers ask for it right
/// before each protected call instead of holding on to a copy.
pub struct TokenManager<C: TokenExchanger + 'static> {
    exchanger: Arc<C>,
    store: TokenStore,
    current_tokens: RwLock<Option<TokenSet>>,
    state: watch::Sender<LifecycleState>,
    refresh_lock: Mutex<()>,
    refresh_threshold_seconds: i64,
}

impl<C: TokenExchanger + 'static> TokenManager<C> {
    /// Create a new token manager
    ///
    /// # Arguments
    /// * `exchanger` - Used for refresh
    /// * `store` - Durable token record and session verifier
    /// * `refresh_threshold_seconds` - Treat the token as expired this many
    ///   seconds early (0 refreshes exactly at expiry)
    #[must_use]
    pub fn new(exchanger: Arc<C>, store: TokenStore, refresh_threshold_seconds: i64) -> Self {
        let (state, _) = watch::channel(LifecycleState::Unauthenticated);
        Self {
            exchanger,
            store,
            current_tokens: RwLock::new(None),
            state,
            refresh_lock: Mutex::new(()),
            refresh_threshold_seconds,
        }
    }

    /// Load tokens from the durable store
    ///
    /// `Valid` if a record exists, `Unauthenticated` otherwise.
    ///
    /// # Errors
    /// Returns `Storage` if the durable store cannot be read.
    pub async fn initialize(&self) -> Result<bool, TokenManagerError> {
        match self.store.load_tokens().await? {
            Some(tokens) => {
                *self.current_tokens.write().await = Some(tokens);
                self.set_state(LifecycleState::Valid);
                info!("Token manager initialized with existing tokens");
                Ok(true)
            }
            None => {
                debug!("No existing tokens found in durable store");
                self.set_state(LifecycleState::Unauthenticated);
                Ok(false)
            }
        }
    }

    /// Store new tokens (after a successful exchange)
    ///
    /// # Errors
    /// Returns `Storage` if the durable store cannot be written.
    pub async fn store_tokens(&self, tokens: TokenSet) -> Result<(), TokenManagerError> {
        self.store.save_tokens(&tokens).await?;
        *self.current_tokens.write().await = Some(tokens);
        self.set_state(LifecycleState::Valid);

        info!("Tokens stored successfully");
        Ok(())
    }

    /// Get current access token, refreshing first if it has expired
    ///
    /// At most one refresh is attempted per call. A failed refresh tears the
    /// token set down and leaves the manager `Invalid`.
    ///
    /// # Errors
    /// - `NotAuthenticated` when `Unauthenticated` or `Invalid`
    /// - `RefreshFailed` when the refresh attempt failed
    /// - `Storage` when the refreshed set could not be persisted
    pub async fn access_token(&self) -> Result<String, TokenManagerError> {
        if let Some(token) = self.fresh_access_token().await? {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed (or torn down) while we waited.
        if let Some(token) = self.fresh_access_token().await? {
            return Ok(token);
        }

        self.refresh_locked().await
    }

    /// Force a refresh regardless of expiry
    ///
    /// # Errors
    /// Same as [`TokenManager::access_token`].
    pub async fn refresh_tokens(&self) -> Result<(), TokenManagerError> {
        let _guard = self.refresh_lock.lock().await;
        if !self.state().is_usable() {
            return Err(TokenManagerError::NotAuthenticated);
        }
        self.refresh_locked().await.map(|_| ())
    }

    /// Tear down after the protected resource answered 401
    ///
    /// Moves to `Invalid` from any state and clears the durable token record
    /// and the session verifier.
    ///
    /// # Errors
    /// Returns `Storage` if a store could not be cleared; the in-memory state
    /// is `Invalid` regardless.
    pub async fn invalidate(&self) -> Result<(), TokenManagerError> {
        warn!("Access token rejected; tearing down token set");
        self.teardown(LifecycleState::Invalid).await
    }

    /// Explicit logout
    ///
    /// # Errors
    /// Returns `Storage` if a store could not be cleared.
    pub async fn disconnect(&self) -> Result<(), TokenManagerError> {
        info!("Tokens cleared (logged out)");
        self.teardown(LifecycleState::Unauthenticated).await
    }

    /// Subscribe to lifecycle transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Get current token set (without refresh)
    pub async fn get_tokens(&self) -> Option<TokenSet> {
        self.current_tokens.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state().is_usable() && self.current_tokens.read().await.is_some()
    }

    pub async fn seconds_until_expiry(&self) -> Option<i64> {
        let tokens = self.current_tokens.read().await;
        tokens.as_ref().and_then(TokenSet::seconds_until_expiry)
    }

    #[must_use]
    pub fn refresh_threshold(&self) -> i64 {
        self.refresh_threshold_seconds
    }

    /// Current token if usable and not expired; `None` when a refresh is due.
    async fn fresh_access_token(&self) -> Result<Option<String>, TokenManagerError> {
        if !self.state().is_usable() {
            return Err(TokenManagerError::NotAuthenticated);
        }

        let tokens = self.current_tokens.read().await;
        match tokens.as_ref() {
            Some(t) if !t.is_expired(self.refresh_threshold_seconds) => {
                Ok(Some(t.access_token.clone()))
            }
            Some(_) => Ok(None),
            None => Err(TokenManagerError::NotAuthenticated),
        }
    }

    /// Caller must hold `refresh_lock`.
    async fn refresh_locked(&self) -> Result<String, TokenManagerError> {
        self.set_state(LifecycleState::Expired);

        let refresh_token = {
            let tokens = self.current_tokens.read().await;
            tokens.as_ref().and_then(|t| t.refresh_token.clone())
        };

        let Some(refresh_token) = refresh_token else {
            self.teardown_quietly().await;
            return Err(TokenManagerError::RefreshFailed("no refresh token available".into()));
        };

        info!("Access token expired, refreshing");
        match self.exchanger.refresh(&refresh_token).await {
            Ok(new_tokens) => {
                let new_tokens = new_tokens.with_carried_refresh_token(Some(&refresh_token));
                let access_token = new_tokens.access_token.clone();
                self.install_refreshed(new_tokens).await?;
                info!("Successfully refreshed access token");
                Ok(access_token)
            }
            Err(err) => {
                warn!(error = %err, "Token refresh failed");
                self.teardown_quietly().await;
                Err(TokenManagerError::RefreshFailed(err.to_string()))
            }
        }
    }

    /// Persist a refreshed set unless the session was torn down meanwhile.
    async fn install_refreshed(&self, tokens: TokenSet) -> Result<(), TokenManagerError> {
        let mut current = self.current_tokens.write().await;
        if current.is_none() || !self.state().is_usable() {
            debug!("Token set torn down during refresh; discarding refreshed tokens");
            return Err(TokenManagerError::NotAuthenticated);
        }

        self.store.save_tokens(&tokens).await?;
        *current = Some(tokens);
        self.set_state(LifecycleState::Valid);
        Ok(())
    }

    async fn teardown(&self, next: LifecycleState) -> Result<(), TokenManagerError> {
        *self.current_tokens.write().await = None;
        self.set_state(next);
        self.store.clear_all().await.map_err(Into::into)
    }

    async fn teardown_quietly(&self) {
        if let Err(err) = self.teardown(LifecycleState::Invalid).await {
            warn!(error = %err, "Failed to clear stores during teardown");
        }
    }

    fn set_state(&self, next: LifecycleState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(from = %previous, to = %next, "Lifecycle transition");
        }
    }
}
