//! Spotify currently-playing client

use async_trait::async_trait;
use nowplaying_core::NowPlayingProvider;
use nowplaying_domain::{NowPlayingError, Result, SpotifyConfig, Track};
use reqwest::{Method, Response, StatusCode};
use tracing::{debug, instrument, warn};

use super::types::CurrentlyPlayingResponse;
use crate::http::HttpClient;

/// Reads the user's currently-playing item straight from the provider.
///
/// Used by the relay's `/current-track` endpoint.
#[derive(Clone)]
pub struct SpotifyPlayerClient {
    http: HttpClient,
    endpoint: String,
}

impl SpotifyPlayerClient {
    pub fn new(config: &SpotifyConfig) -> Result<Self> {
        Ok(Self::with_http_client(config, HttpClient::new()?))
    }

    pub fn with_http_client(config: &SpotifyConfig, http: HttpClient) -> Self {
        Self { http, endpoint: config.currently_playing_endpoint() }
    }
}

#[async_trait]
impl NowPlayingProvider for SpotifyPlayerClient {
    #[instrument(skip_all)]
    async fn currently_playing(&self, access_token: &str) -> Result<Option<Track>> {
        let request = self.http.request(Method::GET, &self.endpoint).bearer_auth(access_token);
        let response = self.http.send(request).await?;

        let Some(body) = playing_body(response).await? else {
            return Ok(None);
        };

        let payload: CurrentlyPlayingResponse = serde_json::from_slice(&body).map_err(|e| {
            warn!(error = %e, "Provider sent an undecodable currently-playing payload");
            NowPlayingError::Upstream {
                status: StatusCode::BAD_GATEWAY.as_u16(),
                body: format!("invalid currently-playing payload: {e}"),
            }
        })?;

        Ok(payload.into_track())
    }
}

/// Classify a currently-playing response.
///
/// `Ok(None)` for 204 or an empty 200 body, `Ok(Some(body))` for a 200 with
/// content. 401 becomes `Unauthorized`; every other status becomes `Upstream`
/// carrying the status and body.
pub(crate) async fn playing_body(response: Response) -> Result<Option<Vec<u8>>> {
    let status = response.status();

    if status == StatusCode::NO_CONTENT {
        debug!("Nothing playing");
        return Ok(None);
    }

    if status == StatusCode::UNAUTHORIZED {
        let body = response.text().await.unwrap_or_default();
        return Err(NowPlayingError::Unauthorized(if body.is_empty() {
            "access token rejected".to_string()
        } else {
            body
        }));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(NowPlayingError::Upstream { status: status.as_u16(), body });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| NowPlayingError::Network(format!("failed to read response body: {e}")))?;

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    Ok(Some(body.to_vec()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> SpotifyPlayerClient {
        let config = SpotifyConfig {
            client_id: "client123".to_string(),
            client_secret: None,
            redirect_uri: "http://127.0.0.1:3001/callback".to_string(),
            scopes: vec!["user-read-currently-playing".to_string()],
            accounts_url: "http://unused.invalid".to_string(),
            api_url: server.uri(),
        };
        let http = HttpClient::builder()
            .base_backoff(Duration::from_millis(5))
            .max_attempts(2)
            .build()
            .unwrap();
        SpotifyPlayerClient::with_http_client(&config, http)
    }

    #[tokio::test]
    async fn maps_playing_track_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/me/player/currently-playing"))
            .and(header("authorization", "Bearer AT1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "is_playing": true,
                "item": {
                    "name": "Song",
                    "artists": [{"name": "A"}],
                    "album": {"name": "Album", "images": [{"url": "https://img/1"}]}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let track = client(&server).currently_playing("AT1").await.unwrap().unwrap();
        assert_eq!(track.name, "Song");
        assert_eq!(track.album_art.as_deref(), Some("https://img/1"));
    }

    #[tokio::test]
    async fn no_content_and_empty_body_are_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer idle"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer empty"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client(&server);
        assert!(client.currently_playing("idle").await.unwrap().is_none());
        assert!(client.currently_playing("empty").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unauthorized_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("The access token expired"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).currently_playing("AT1").await.unwrap_err();
        assert_eq!(err, NowPlayingError::Unauthorized("The access token expired".to_string()));
    }

    #[tokio::test]
    async fn other_statuses_are_upstream_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = client(&server).currently_playing("AT1").await.unwrap_err();
        assert_eq!(err, NowPlayingError::Upstream { status: 429, body: "slow down".to_string() });
    }
}
