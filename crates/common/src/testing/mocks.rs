//! Mock implementations of the auth traits
//!
//! Provides deterministic, in-memory stand-ins for the token endpoint so
//! lifecycle and orchestration logic can be exercised without a network.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nowplaying_domain::{NowPlayingError, Result};

use crate::auth::{TokenExchanger, TokenSet};

/// Mock token exchanger that records calls and replays configured responses.
///
/// Defaults: `exchange` answers `{AT1, RT1, 3600}`; `refresh` answers
/// `{refreshed_access_token, 3600}` without a refresh token.
#[derive(Clone, Default)]
pub struct MockTokenExchanger {
    exchange_response: Arc<Mutex<Option<Result<TokenSet>>>>,
    refresh_response: Arc<Mutex<Option<Result<TokenSet>>>>,
    exchange_calls: Arc<Mutex<Vec<(String, String)>>>,
    refresh_calls: Arc<Mutex<Vec<String>>>,
}

impl MockTokenExchanger {
    /// Create a new mock exchanger with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the result returned by every `exchange`.
    pub fn set_exchange_response(&self, response: Result<TokenSet>) {
        *self.exchange_response.lock().unwrap() = Some(response);
    }

    /// Configure the result returned by every `refresh`.
    pub fn set_refresh_response(&self, response: Result<TokenSet>) {
        *self.refresh_response.lock().unwrap() = Some(response);
    }

    #[must_use]
    pub fn exchange_calls(&self) -> Vec<(String, String)> {
        self.exchange_calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.lock().unwrap().len()
    }

    #[must_use]
    pub fn last_refresh_token(&self) -> Option<String> {
        self.refresh_calls.lock().unwrap().last().cloned()
    }

    /// Reset internal state.
    pub fn reset(&self) {
        *self.exchange_response.lock().unwrap() = None;
        *self.refresh_response.lock().unwrap() = None;
        self.exchange_calls.lock().unwrap().clear();
        self.refresh_calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl TokenExchanger for MockTokenExchanger {
    async fn exchange(&self, code: &str, code_verifier: &str) -> Result<TokenSet> {
        if code.is_empty() {
            return Err(NowPlayingError::MissingParameter("code".to_string()));
        }
        if code_verifier.is_empty() {
            return Err(NowPlayingError::MissingParameter("code_verifier".to_string()));
        }

        self.exchange_calls.lock().unwrap().push((code.to_string(), code_verifier.to_string()));

        match self.exchange_response.lock().unwrap().as_ref() {
            Some(response) => response.clone(),
            None => Ok(TokenSet::new("AT1".to_string(), Some("RT1".to_string()), 3600, None)),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet> {
        self.refresh_calls.lock().unwrap().push(refresh_token.to_string());

        let response = match self.refresh_response.lock().unwrap().as_ref() {
            Some(response) => response.clone(),
            None => Ok(TokenSet::new("refreshed_access_token".to_string(), None, 3600, None)),
        };
        response.map(|tokens| tokens.with_carried_refresh_token(Some(refresh_token)))
    }
}
