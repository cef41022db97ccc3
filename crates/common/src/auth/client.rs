//! Server-side token endpoint client
//!
//! Redeems authorization codes and refresh tokens against the provider's
//! token endpoint using the confidential client credentials. Only the relay
//! holds an `OAuthClient`; applications talk to the relay instead.

use std::time::Duration;

use async_trait::async_trait;
use nowplaying_domain::{NowPlayingError, SpotifyConfig};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use super::traits::TokenExchanger;
use super::types::{TokenResponse, TokenSet};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for OAuth client operations
#[derive(Debug, Error)]
pub enum OAuthClientError {
    /// A required argument was empty; nothing was sent
    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    /// Token endpoint answered with a non-success status
    #[error("Token endpoint returned {status}: {body}")]
    ExchangeFailed { status: u16, body: String },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse response
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<OAuthClientError> for NowPlayingError {
    fn from(err: OAuthClientError) -> Self {
        match err {
            OAuthClientError::MissingParameter(name) => Self::MissingParameter(name.to_string()),
            OAuthClientError::ExchangeFailed { status, body } => {
                Self::ExchangeFailed { status, body }
            }
            OAuthClientError::RequestFailed(e) => Self::Network(e.to_string()),
            OAuthClientError::ParseError(msg) => Self::Internal(msg),
        }
    }
}

/// Token endpoint client for the authorization-code + PKCE grant
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: SpotifyConfig,
    client: Client,
}

impl OAuthClient {
    /// Create a client with the default 30 second transport timeout.
    ///
    /// # Errors
    /// Returns `RequestFailed` if the HTTP client cannot be built.
    pub fn new(config: SpotifyConfig) -> Result<Self, OAuthClientError> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self::with_http_client(config, client))
    }

    /// Create a client on top of an existing `reqwest::Client`.
    #[must_use]
    pub fn with_http_client(config: SpotifyConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Exchange authorization code for tokens
    ///
    /// Sends exactly one form-encoded POST:
    /// `grant_type=authorization_code, code, redirect_uri, client_id,
    /// code_verifier`, authenticated with HTTP Basic when a client secret is
    /// configured.
    ///
    /// # Errors
    /// - `MissingParameter` if `code` or `code_verifier` is empty (no request
    ///   is made)
    /// - `ExchangeFailed` carrying the provider's status and body verbatim
    /// - `RequestFailed` on transport errors
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        if code.is_empty() {
            return Err(OAuthClientError::MissingParameter("code"));
        }
        if code_verifier.is_empty() {
            return Err(OAuthClientError::MissingParameter("code_verifier"));
        }

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("code_verifier", code_verifier),
        ];

        debug!("Exchanging authorization code");
        let response: TokenResponse = self.post_token_request(&params).await?;

        Ok(response.into())
    }

    /// Refresh access token using refresh token
    ///
    /// The provider may omit `refresh_token` from the response; the input
    /// token is then carried forward.
    ///
    /// # Errors
    /// Same as [`OAuthClient::exchange_code`].
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::MissingParameter("refresh_token"));
        }

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
        ];

        debug!("Refreshing access token");
        let response: TokenResponse = self.post_token_request(&params).await?;

        Ok(TokenSet::from(response).with_carried_refresh_token(Some(refresh_token)))
    }

    /// Get a reference to the provider configuration
    #[must_use]
    pub fn config(&self) -> &SpotifyConfig {
        &self.config
    }

    async fn post_token_request(
        &self,
        params: &[(&str, &str)],
    ) -> Result<TokenResponse, OAuthClientError> {
        let mut request = self.client.post(self.config.token_endpoint()).form(params);
        if let Some(secret) = self.config.client_secret.as_deref() {
            request = request.basic_auth(&self.config.client_id, Some(secret));
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Token endpoint rejected request");
            return Err(OAuthClientError::ExchangeFailed { status: status.as_u16(), body });
        }

        response.json().await.map_err(|e| OAuthClientError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl TokenExchanger for OAuthClient {
    async fn exchange(&self, code: &str, code_verifier: &str) -> nowplaying_domain::Result<TokenSet> {
        self.exchange_code(code, code_verifier).await.map_err(Into::into)
    }

    async fn refresh(&self, refresh_token: &str) -> nowplaying_domain::Result<TokenSet> {
        self.refresh_access_token(refresh_token).await.map_err(Into::into)
    }
}
