//! Authorization request URLs
//!
//! Two URLs start a login: the relay's `/login` (built by applications, carries
//! only the challenge) and the provider authorization URL (built by the relay,
//! carries the client id, redirect URI and scopes too).

use nowplaying_domain::constants::PKCE_CHALLENGE_METHOD;
use nowplaying_domain::NowPlayingError;
use thiserror::Error;
use url::Url;

/// Error type for authorization URL construction
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthorizeError {
    #[error("code challenge is empty")]
    EmptyChallenge,

    #[error("client id is empty")]
    EmptyClientId,

    #[error("redirect URI is empty")]
    EmptyRedirectUri,

    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

impl From<AuthorizeError> for NowPlayingError {
    fn from(err: AuthorizeError) -> Self {
        match err {
            AuthorizeError::EmptyChallenge => Self::MissingParameter("code_challenge".to_string()),
            AuthorizeError::EmptyClientId | AuthorizeError::EmptyRedirectUri => {
                Self::Config(err.to_string())
            }
            AuthorizeError::InvalidEndpoint { .. } => Self::Config(err.to_string()),
        }
    }
}

/// Build the provider authorization URL for one login attempt.
///
/// Query parameters: `response_type=code`, `client_id`, `scope`,
/// `redirect_uri`, `code_challenge_method=S256`, `code_challenge`. All values
/// are URL-encoded.
///
/// # Errors
/// Returns `EmptyChallenge`, `EmptyClientId` or `EmptyRedirectUri` for blank
/// inputs and `InvalidEndpoint` if `authorize_endpoint` is not a URL.
///
/// # Examples
/// ```
/// use nowplaying_common::auth::build_authorization_url;
///
/// let url = build_authorization_url(
///     "https://accounts.spotify.com/authorize",
///     "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM",
///     "client123",
///     "http://127.0.0.1:3001/callback",
///     "user-read-currently-playing",
/// )
/// .unwrap();
/// assert!(url.as_str().contains("code_challenge_method=S256"));
/// ```
pub fn build_authorization_url(
    authorize_endpoint: &str,
    code_challenge: &str,
    client_id: &str,
    redirect_uri: &str,
    scope: &str,
) -> Result<Url, AuthorizeError> {
    if code_challenge.is_empty() {
        return Err(AuthorizeError::EmptyChallenge);
    }
    if client_id.trim().is_empty() {
        return Err(AuthorizeError::EmptyClientId);
    }
    if redirect_uri.trim().is_empty() {
        return Err(AuthorizeError::EmptyRedirectUri);
    }

    let mut url = parse_endpoint(authorize_endpoint)?;
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", client_id)
        .append_pair("scope", scope)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("code_challenge_method", PKCE_CHALLENGE_METHOD)
        .append_pair("code_challenge", code_challenge);

    Ok(url)
}

/// Build the relay `/login` URL an application navigates to.
///
/// # Errors
/// Returns `EmptyChallenge` or `InvalidEndpoint`.
pub fn build_relay_login_url(relay_url: &str, code_challenge: &str) -> Result<Url, AuthorizeError> {
    if code_challenge.is_empty() {
        return Err(AuthorizeError::EmptyChallenge);
    }

    let mut url = parse_endpoint(relay_url)?;
    url.set_path("/login");
    url.query_pairs_mut()
        .append_pair("code_challenge", code_challenge)
        .append_pair("code_challenge_method", PKCE_CHALLENGE_METHOD);

    Ok(url)
}

fn parse_endpoint(endpoint: &str) -> Result<Url, AuthorizeError> {
    Url::parse(endpoint).map_err(|e| AuthorizeError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}
