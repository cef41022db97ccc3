//! Client-side login orchestrator
//!
//! Combines the PKCE generator, token store, exchanger and token manager into
//! the two halves of a login: `start_login` before leaving for the provider,
//! `complete_login` when the callback comes back.

use std::sync::Arc;

use nowplaying_domain::NowPlayingError;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use super::authorize::{build_relay_login_url, AuthorizeError};
use super::callback::CallbackState;
use super::pkce::PkceChallenge;
use super::store::TokenStore;
use super::token_manager::{TokenManager, TokenManagerError};
use super::traits::TokenExchanger;
use super::types::TokenSet;

/// Error type for OAuth service operations
#[derive(Debug, Error)]
pub enum OAuthServiceError {
    #[error("Token manager error: {0}")]
    TokenManager(#[from] TokenManagerError),

    #[error("Authorization URL error: {0}")]
    Authorize(#[from] AuthorizeError),

    /// The provider redirected back with an error
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    /// A callback arrived but no login is in progress
    #[error("No pending login (code verifier missing)")]
    NoPendingLogin,

    /// Exchange, refresh or storage failure
    #[error(transparent)]
    Domain(#[from] NowPlayingError),
}

impl From<OAuthServiceError> for NowPlayingError {
    fn from(err: OAuthServiceError) -> Self {
        match err {
            OAuthServiceError::TokenManager(e) => e.into(),
            OAuthServiceError::Authorize(e) => e.into(),
            OAuthServiceError::AuthorizationDenied(e) => Self::ProviderAuthorization(e),
            OAuthServiceError::NoPendingLogin => {
                Self::MissingParameter("code_verifier".to_string())
            }
            OAuthServiceError::Domain(e) => e,
        }
    }
}

/// Login orchestrator for applications talking to the relay
pub struct OAuthService<C: TokenExchanger + 'static> {
    relay_url: String,
    exchanger: Arc<C>,
    store: TokenStore,
    token_manager: Arc<TokenManager<C>>,
}

impl<C: TokenExchanger + 'static> OAuthService<C> {
    /// Create a new OAuth service
    ///
    /// # Arguments
    /// * `relay_url` - Base URL of the relay (`/login` is appended)
    /// * `exchanger` - Exchanges codes and refresh tokens
    /// * `store` - Durable token record and session verifier
    /// * `refresh_threshold_seconds` - Passed to the token manager
    #[must_use]
    pub fn new(
        relay_url: impl Into<String>,
        exchanger: Arc<C>,
        store: TokenStore,
        refresh_threshold_seconds: i64,
    ) -> Self {
        let token_manager =
            Arc::new(TokenManager::new(exchanger.clone(), store.clone(), refresh_threshold_seconds));
        Self { relay_url: relay_url.into(), exchanger, store, token_manager }
    }

    /// Load persisted tokens.
    ///
    /// # Errors
    /// Returns error if the durable store cannot be read.
    pub async fn initialize(&self) -> Result<bool, OAuthServiceError> {
        self.token_manager.initialize().await.map_err(Into::into)
    }

    /// Start a login
    ///
    /// Generates a fresh PKCE pair, stores the verifier (replacing any
    /// previous one) and only then returns the relay `/login` URL to navigate
    /// to.
    ///
    /// # Errors
    /// Returns error if the verifier cannot be stored.
    pub async fn start_login(&self) -> Result<Url, OAuthServiceError> {
        let challenge = PkceChallenge::generate();
        self.store.save_verifier(&challenge.code_verifier).await?;

        let url = build_relay_login_url(&self.relay_url, &challenge.code_challenge)?;
        info!("Generated relay login URL");
        Ok(url)
    }

    /// Complete a login from the forwarded callback parameters
    ///
    /// The verifier is consumed whether the exchange succeeds or fails.
    ///
    /// # Errors
    /// - `AuthorizationDenied` if the callback carried `?error=`
    /// - `NoPendingLogin` if no verifier is stored
    /// - `Domain` with the exchange failure otherwise
    pub async fn complete_login(
        &self,
        callback: CallbackState,
    ) -> Result<TokenSet, OAuthServiceError> {
        let code = match callback {
            CallbackState::CodeReceived(code) => code,
            CallbackState::ErrorReceived(error) => {
                self.store.clear_verifier().await?;
                warn!(error = %error, "Provider returned an authorization error");
                return Err(OAuthServiceError::AuthorizationDenied(error));
            }
            CallbackState::AwaitingCallback => {
                return Err(NowPlayingError::MissingParameter("code".to_string()).into());
            }
        };

        let verifier = self.store.take_verifier().await?.ok_or(OAuthServiceError::NoPendingLogin)?;

        let tokens = self.exchanger.exchange(&code, &verifier).await?;
        self.token_manager.store_tokens(tokens.clone()).await?;

        info!("Login completed");
        Ok(tokens)
    }

    /// Whether a login is awaiting its callback.
    ///
    /// # Errors
    /// Returns error if the session store cannot be read.
    pub async fn has_pending_login(&self) -> Result<bool, OAuthServiceError> {
        self.store.has_verifier().await.map_err(Into::into)
    }

    /// Access token for the next protected call (refreshing if needed).
    ///
    /// # Errors
    /// See [`TokenManager::access_token`].
    pub async fn get_access_token(&self) -> Result<String, OAuthServiceError> {
        self.token_manager.access_token().await.map_err(Into::into)
    }

    /// Log out and clear both stores.
    ///
    /// # Errors
    /// Returns error if a store cannot be cleared.
    pub async fn logout(&self) -> Result<(), OAuthServiceError> {
        self.token_manager.disconnect().await.map_err(Into::into)
    }

    #[must_use]
    pub fn token_manager(&self) -> Arc<TokenManager<C>> {
        Arc::clone(&self.token_manager)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::service.
    use std::collections::HashMap;

    use nowplaying_domain::constants::CODE_VERIFIER_KEY;
    use nowplaying_domain::LifecycleState;

    use super::*;
    use crate::auth::pkce::generate_code_challenge;
    use crate::auth::{KeyValueStore, MemoryStore};
    use crate::testing::MockTokenExchanger;

    fn service() -> (OAuthService<MockTokenExchanger>, Arc<MockTokenExchanger>, MemoryStore) {
        let exchanger = Arc::new(MockTokenExchanger::new());
        let session = MemoryStore::new();
        let store = TokenStore::new(Arc::new(MemoryStore::new()), Arc::new(session.clone()));
        (OAuthService::new("http://127.0.0.1:3001", exchanger.clone(), store, 0), exchanger, session)
    }

    /// Validates `OAuthService::start_login` behavior for the verifier
    /// persistence scenario.
    ///
    /// Assertions:
    /// - Ensures the verifier is stored before the URL is returned.
    /// - Confirms the URL's challenge is derived from the stored verifier.
    #[tokio::test]
    async fn test_start_login_persists_verifier_first() {
        let (service, _, session) = service();

        let url = service.start_login().await.unwrap();

        let verifier = session.get(CODE_VERIFIER_KEY).await.unwrap().unwrap();
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(url.path(), "/login");
        assert_eq!(params["code_challenge"], generate_code_challenge(&verifier));
        assert_eq!(params["code_challenge_method"], "S256");
    }

    #[tokio::test]
    async fn test_new_login_overwrites_previous_verifier() {
        let (service, _, session) = service();

        service.start_login().await.unwrap();
        let first = session.get(CODE_VERIFIER_KEY).await.unwrap();
        service.start_login().await.unwrap();
        let second = session.get(CODE_VERIFIER_KEY).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(session.len().await, 1);
    }

    #[tokio::test]
    async fn test_complete_login_exchanges_and_consumes_verifier() {
        let (service, exchanger, session) = service();
        service.start_login().await.unwrap();
        let verifier = session.get(CODE_VERIFIER_KEY).await.unwrap().unwrap();

        let tokens =
            service.complete_login(CallbackState::CodeReceived("XYZ".into())).await.unwrap();

        assert_eq!(tokens.access_token, "AT1");
        assert_eq!(exchanger.exchange_calls(), vec![("XYZ".to_string(), verifier)]);
        assert!(session.is_empty().await);
        assert_eq!(service.token_manager().state(), LifecycleState::Valid);
    }

    #[tokio::test]
    async fn test_failed_exchange_still_consumes_verifier() {
        let (service, exchanger, session) = service();
        exchanger.set_exchange_response(Err(NowPlayingError::ExchangeFailed {
            status: 400,
            body: "invalid_grant".to_string(),
        }));
        service.start_login().await.unwrap();

        let result = service.complete_login(CallbackState::CodeReceived("XYZ".into())).await;

        assert!(matches!(
            result,
            Err(OAuthServiceError::Domain(NowPlayingError::ExchangeFailed { status: 400, .. }))
        ));
        assert!(session.is_empty().await);
        assert_eq!(service.token_manager().state(), LifecycleState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_provider_error_clears_verifier() {
        let (service, exchanger, session) = service();
        service.start_login().await.unwrap();

        let result =
            service.complete_login(CallbackState::ErrorReceived("access_denied".into())).await;

        assert!(matches!(result, Err(OAuthServiceError::AuthorizationDenied(ref e)) if e == "access_denied"));
        assert!(session.is_empty().await);
        assert!(exchanger.exchange_calls().is_empty());
    }

    #[tokio::test]
    async fn test_callback_without_pending_login() {
        let (service, exchanger, _) = service();

        let result = service.complete_login(CallbackState::CodeReceived("XYZ".into())).await;

        assert!(matches!(result, Err(OAuthServiceError::NoPendingLogin)));
        assert!(exchanger.exchange_calls().is_empty());
    }

    #[tokio::test]
    async fn test_logout() {
        let (service, _, _) = service();
        service.start_login().await.unwrap();
        service.complete_login(CallbackState::CodeReceived("XYZ".into())).await.unwrap();

        service.logout().await.unwrap();

        assert!(!service.token_manager().is_authenticated().await);
        assert!(!service.has_pending_login().await.unwrap());
    }
}
