//! OAuth 2.0 authorization-code + PKCE flow against Spotify
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  OAuthService   │  Client-side login orchestrator
//! └────────┬────────┘
//!          │
//!          ├──► PKCE utilities     (verifier + challenge)
//!          ├──► TokenExchanger     (relay client, or OAuthClient on the relay)
//!          └──► TokenManager       (validate-or-refresh, 401 teardown)
//!                    │
//!                    └──► TokenStore ──► KeyValueStore (file, keychain, memory)
//! ```
//!
//! The relay side uses [`build_authorization_url`], [`CallbackRelay`] and
//! [`OAuthClient`] directly.
//!
//! # Module Organization
//!
//! - **[`types`]**: `TokenSet`, provider responses, relay wire types
//! - **[`pkce`]**: verifier/challenge generation
//! - **[`authorize`]**: provider and relay login URLs
//! - **[`callback`]**: callback classification and forwarding
//! - **[`client`]**: provider token endpoint client
//! - **[`store`]**: token persistence over key-value stores
//! - **[`token_manager`]**: token lifecycle state machine
//! - **[`service`]**: login orchestrator

pub mod authorize;
pub mod callback;
pub mod client;
#[cfg(feature = "keychain")]
mod keychain;
pub mod pkce;
pub mod service;
pub mod store;
pub mod token_manager;
pub mod traits;
pub mod types;

pub use authorize::{build_authorization_url, build_relay_login_url, AuthorizeError};
pub use callback::{CallbackRelay, CallbackState};
pub use client::{OAuthClient, OAuthClientError};
#[cfg(feature = "keychain")]
pub use keychain::KeychainStore;
pub use pkce::{
    generate_code_challenge, generate_code_verifier, is_valid_code_verifier, PkceChallenge,
};
pub use service::{OAuthService, OAuthServiceError};
pub use store::{MemoryStore, TokenStore};
pub use token_manager::{TokenManager, TokenManagerError};
pub use traits::{KeyValueStore, TokenExchanger};
pub use types::{
    ErrorBody, ExchangeTokenRequest, OAuthError, RefreshTokenRequest, TokenPayload, TokenResponse,
    TokenSet,
};
