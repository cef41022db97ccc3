//! HTTP clients for the relay, used by the CLI
//!
//! The CLI never talks to the provider's token endpoint directly; it goes
//! through the relay, which holds the client secret.

use async_trait::async_trait;
use nowplaying_common::auth::{
    ErrorBody, ExchangeTokenRequest, RefreshTokenRequest, TokenExchanger, TokenPayload, TokenSet,
};
use nowplaying_core::NowPlayingProvider;
use nowplaying_domain::{NowPlayingError, Result, Track};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, instrument, warn};
use url::Url;

use super::player::playing_body;
use crate::http::HttpClient;

fn relay_endpoint(relay_url: &str, path: &str) -> Result<Url> {
    let base = Url::parse(relay_url)
        .map_err(|e| NowPlayingError::Config(format!("invalid relay URL {relay_url}: {e}")))?;
    base.join(path)
        .map_err(|e| NowPlayingError::Config(format!("invalid relay URL {relay_url}: {e}")))
}

/// [`TokenExchanger`] backed by the relay's `/exchange-token` and
/// `/refresh-token` endpoints.
#[derive(Clone)]
pub struct RelayTokenClient {
    http: HttpClient,
    exchange_url: Url,
    refresh_url: Url,
}

impl RelayTokenClient {
    pub fn new(relay_url: &str) -> Result<Self> {
        Self::with_http_client(relay_url, HttpClient::new()?)
    }

    pub fn with_http_client(relay_url: &str, http: HttpClient) -> Result<Self> {
        Ok(Self {
            http,
            exchange_url: relay_endpoint(relay_url, "/exchange-token")?,
            refresh_url: relay_endpoint(relay_url, "/refresh-token")?,
        })
    }

    /// One POST, never retried.
    async fn post<B: Serialize + ?Sized>(&self, url: &Url, body: &B) -> Result<TokenSet> {
        let request = self.http.request(Method::POST, url.clone()).json(body);
        let response = self.http.send_once(request).await?;
        let status = response.status();

        if !status.is_success() {
            return Err(relay_error(response).await);
        }

        let payload: TokenPayload = response.json().await.map_err(|e| {
            NowPlayingError::ExchangeFailed {
                status: status.as_u16(),
                body: format!("invalid token payload: {e}"),
            }
        })?;

        Ok(payload.into())
    }
}

#[async_trait]
impl TokenExchanger for RelayTokenClient {
    #[instrument(skip_all)]
    async fn exchange(&self, code: &str, code_verifier: &str) -> Result<TokenSet> {
        if code.is_empty() {
            return Err(NowPlayingError::MissingParameter("code".to_string()));
        }
        if code_verifier.is_empty() {
            return Err(NowPlayingError::MissingParameter("code_verifier".to_string()));
        }

        debug!("Exchanging authorization code through relay");
        let body = ExchangeTokenRequest {
            code: code.to_string(),
            code_verifier: code_verifier.to_string(),
        };
        self.post(&self.exchange_url, &body).await
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet> {
        if refresh_token.is_empty() {
            return Err(NowPlayingError::MissingParameter("refresh_token".to_string()));
        }

        debug!("Refreshing access token through relay");
        let body = RefreshTokenRequest { refresh_token: refresh_token.to_string() };
        let tokens = self.post(&self.refresh_url, &body).await?;
        Ok(tokens.with_carried_refresh_token(Some(refresh_token)))
    }
}

/// Map a relay `{error, details}` response back onto the domain error.
async fn relay_error(response: Response) -> NowPlayingError {
    let status = response.status().as_u16();
    let raw = response.text().await.unwrap_or_default();

    let Ok(ErrorBody { error, details }) = serde_json::from_str::<ErrorBody>(&raw) else {
        warn!(status, "Relay returned a non-JSON error body");
        return NowPlayingError::ExchangeFailed { status, body: raw };
    };

    match (status, error.as_str()) {
        (400, "missing_parameter") => {
            NowPlayingError::MissingParameter(details.unwrap_or(error))
        }
        (401, _) => NowPlayingError::Unauthorized(details.unwrap_or(error)),
        _ => NowPlayingError::ExchangeFailed { status, body: details.unwrap_or(error) },
    }
}

/// [`NowPlayingProvider`] backed by the relay's `/current-track` endpoint.
#[derive(Clone)]
pub struct RelayPlayerClient {
    http: HttpClient,
    current_track_url: Url,
}

impl RelayPlayerClient {
    pub fn new(relay_url: &str) -> Result<Self> {
        Self::with_http_client(relay_url, HttpClient::new()?)
    }

    pub fn with_http_client(relay_url: &str, http: HttpClient) -> Result<Self> {
        Ok(Self { http, current_track_url: relay_endpoint(relay_url, "/current-track")? })
    }
}

#[async_trait]
impl NowPlayingProvider for RelayPlayerClient {
    #[instrument(skip_all)]
    async fn currently_playing(&self, access_token: &str) -> Result<Option<Track>> {
        let request = self
            .http
            .request(Method::GET, self.current_track_url.clone())
            .bearer_auth(access_token);
        let response = self.http.send(request).await?;

        let Some(body) = playing_body(response).await? else {
            return Ok(None);
        };

        serde_json::from_slice(&body).map(Some).map_err(|e| NowPlayingError::Upstream {
            status: StatusCode::BAD_GATEWAY.as_u16(),
            body: format!("invalid track payload: {e}"),
        })
    }
}
