//! Shared authorization plumbing for the now-playing relay and its clients.
//!
//! # Feature Flags
//!
//! - `keychain`: durable token storage in the platform keychain
//! - `test-utils`: mock exchangers for downstream test suites

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

pub use auth::{
    CallbackRelay, CallbackState, KeyValueStore, MemoryStore, OAuthClient, OAuthService,
    PkceChallenge, TokenExchanger, TokenManager, TokenSet, TokenStore,
};
