//! Traits for token exchange and key-value storage
//!
//! These traits enable dependency injection and testing by abstracting
//! external dependencies (the token endpoint, durable and session storage).

use async_trait::async_trait;
use nowplaying_domain::Result;

use super::types::TokenSet;

/// Trait for exchanging authorization material for tokens
///
/// Implemented by the provider client on the relay and by the relay client
/// in applications. Implementations never retry: authorization codes are
/// single-use.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Exchange an authorization code and its PKCE verifier for tokens
    ///
    /// # Errors
    /// `MissingParameter` if either argument is empty (before any network
    /// call), `ExchangeFailed` with the provider's status and body, or
    /// `Network` on transport failure.
    async fn exchange(&self, code: &str, code_verifier: &str) -> Result<TokenSet>;

    /// Obtain a new access token from a refresh token
    ///
    /// When the provider omits a new refresh token the returned set carries
    /// `refresh_token` forward.
    ///
    /// # Errors
    /// Same taxonomy as [`TokenExchanger::exchange`].
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet>;
}

/// Trait for string key-value persistence
///
/// Backs both the durable token record and the per-session verifier.
/// Last writer wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key is absent.
    ///
    /// # Errors
    /// Returns `Storage` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    /// Returns `Storage` if the backend cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value (idempotent).
    ///
    /// # Errors
    /// Returns `Storage` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<()>;
}
