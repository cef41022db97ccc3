//! Provider redirect handling
//!
//! The relay receives the provider's redirect and forwards either the code or
//! the error to the client application. It never redeems the code itself.

use nowplaying_domain::constants::MISSING_CODE_ERROR;
use nowplaying_domain::NowPlayingError;
use url::Url;

use super::authorize::AuthorizeError;

/// Where a single callback stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CallbackState {
    #[default]
    AwaitingCallback,
    CodeReceived(String),
    ErrorReceived(String),
}

impl CallbackState {
    /// Classify callback query parameters.
    ///
    /// An `error` wins over a `code`; a redirect carrying neither (or an empty
    /// code) becomes `ErrorReceived("missing_code")`.
    #[must_use]
    pub fn from_query(code: Option<&str>, error: Option<&str>) -> Self {
        if let Some(error) = error {
            return Self::ErrorReceived(error.to_string());
        }
        match code {
            Some(code) if !code.is_empty() => Self::CodeReceived(code.to_string()),
            _ => Self::ErrorReceived(MISSING_CODE_ERROR.to_string()),
        }
    }

    /// Client origin with `?code=` or `?error=` appended.
    ///
    /// `None` while still awaiting the callback.
    ///
    /// # Errors
    /// Returns `InvalidEndpoint` if `client_origin` is not a URL.
    pub fn forward_url(&self, client_origin: &str) -> Result<Option<Url>, AuthorizeError> {
        let (key, value) = match self {
            Self::AwaitingCallback => return Ok(None),
            Self::CodeReceived(code) => ("code", code),
            Self::ErrorReceived(error) => ("error", error),
        };

        let mut url = Url::parse(client_origin).map_err(|e| AuthorizeError::InvalidEndpoint {
            endpoint: client_origin.to_string(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair(key, value);

        Ok(Some(url))
    }

    /// The code, or the provider error as `ProviderAuthorization`.
    ///
    /// # Errors
    /// `ProviderAuthorization` for `ErrorReceived`, `MissingParameter` while
    /// still awaiting the callback.
    pub fn into_code(self) -> Result<String, NowPlayingError> {
        match self {
            Self::CodeReceived(code) => Ok(code),
            Self::ErrorReceived(error) => Err(NowPlayingError::ProviderAuthorization(error)),
            Self::AwaitingCallback => Err(NowPlayingError::MissingParameter("code".to_string())),
        }
    }
}

/// One-shot callback relay.
///
/// Starts in `AwaitingCallback`; the first `receive` decides the terminal
/// state and later calls leave it unchanged.
#[derive(Debug, Default)]
pub struct CallbackRelay {
    state: CallbackState,
}

impl CallbackRelay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receive(&mut self, code: Option<&str>, error: Option<&str>) -> &CallbackState {
        if self.state == CallbackState::AwaitingCallback {
            self.state = CallbackState::from_query(code, error);
        }
        &self.state
    }

    #[must_use]
    pub fn state(&self) -> &CallbackState {
        &self.state
    }

    /// # Errors
    /// Returns `InvalidEndpoint` if `client_origin` is not a URL.
    pub fn forward_url(&self, client_origin: &str) -> Result<Option<Url>, AuthorizeError> {
        self.state.forward_url(client_origin)
    }
}
