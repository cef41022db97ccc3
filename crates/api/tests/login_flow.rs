//! End-to-end login through a live relay
//!
//! The provider is a wiremock server; the relay and the CLI's loopback
//! listener run on ephemeral ports; the browser is a redirect-following
//! reqwest client.

use std::sync::Arc;
use std::time::Duration;

use nowplaying_common::auth::{KeyValueStore, MemoryStore};
use nowplaying_domain::constants::TOKEN_SET_KEY;
use nowplaying_domain::{
    ClientConfig, Config, LifecycleState, NowPlayingError, ServerConfig, SpotifyConfig,
};
use nowplaying_infra::server::serve;
use nowplaying_infra::AppState;
use nowplaying_lib::commands::{begin_login, status};
use nowplaying_lib::AppContext;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    provider: MockServer,
    relay_url: String,
    relay_listener: Option<TcpListener>,
    relay_shutdown: Option<oneshot::Sender<()>>,
}

impl Harness {
    async fn new() -> Self {
        let provider = MockServer::start().await;
        let relay_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let relay_url = format!("http://{}", relay_listener.local_addr().unwrap());
        Self { provider, relay_url, relay_listener: Some(relay_listener), relay_shutdown: None }
    }

    /// Start the relay once the client origin (the loopback listener) is known.
    fn start_relay(&mut self, client_origin: String) {
        let config = Config {
            spotify: SpotifyConfig {
                client_id: "client123".to_string(),
                client_secret: Some("secret456".to_string()),
                redirect_uri: format!("{}/callback", self.relay_url),
                scopes: vec!["user-read-currently-playing".to_string()],
                accounts_url: self.provider.uri(),
                api_url: self.provider.uri(),
            },
            server: ServerConfig { port: 0, client_origin },
        };
        let state = AppState::from_config(config).unwrap();
        let listener = self.relay_listener.take().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        self.relay_shutdown = Some(tx);
        tokio::spawn(async move {
            serve(listener, state, async move {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            relay_url: self.relay_url.clone(),
            client_origin: "http://127.0.0.1:0".to_string(),
            ..ClientConfig::default()
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        if let Some(tx) = self.relay_shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Validates the whole login round trip.
///
/// # Test Steps
/// 1. Start a login; the URL targets the relay's `/login` with a challenge
/// 2. The browser lands on the relay callback with a code
/// 3. The relay forwards to the loopback listener, which hands the code back
/// 4. The code is exchanged via the relay and the tokens are stored durably
/// 5. The stored token reaches the provider through `/current-track`
#[tokio::test]
async fn test_login_round_trip_through_relay() {
    let mut harness = Harness::new().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AT1",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "RT1",
            "scope": "user-read-currently-playing"
        })))
        .expect(1)
        .mount(&harness.provider)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/currently-playing"))
        .and(header("authorization", "Bearer AT1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_playing": true,
            "item": {
                "name": "Song",
                "artists": [{"name": "A"}, {"name": "B"}],
                "album": {"name": "Album", "images": [{"url": "https://i.scdn.co/image/1"}]}
            }
        })))
        .mount(&harness.provider)
        .await;

    let durable = Arc::new(MemoryStore::new());
    let ctx = AppContext::with_durable_store(harness.client_config(), durable.clone(), "memory")
        .await
        .unwrap();

    let pending = begin_login(&ctx).await.unwrap();
    let login_url = pending.url.clone();
    assert!(login_url.as_str().starts_with(&format!("{}/login", harness.relay_url)));
    assert!(login_url.query_pairs().any(|(k, _)| k == "code_challenge"));
    assert!(status(&ctx).await.unwrap().pending_login);

    harness.start_relay(pending.callback_origin());

    let callback = Url::parse_with_params(
        &format!("{}/callback", harness.relay_url),
        &[("code", "auth-code-1")],
    )
    .unwrap();
    let browser = tokio::spawn(async move { reqwest::get(callback).await.map(|r| r.status()) });

    let tokens = pending.finish(&ctx, Duration::from_secs(10)).await.unwrap();
    assert_eq!(tokens.access_token, "AT1");
    assert_eq!(tokens.refresh_token.as_deref(), Some("RT1"));
    assert!(browser.await.unwrap().unwrap().is_success());

    let report = status(&ctx).await.unwrap();
    assert_eq!(report.state, LifecycleState::Valid);
    assert!(!report.pending_login);
    assert!(durable.get(TOKEN_SET_KEY).await.unwrap().is_some());

    let track = ctx.player.currently_playing("AT1").await.unwrap().unwrap();
    assert_eq!(track.artist, "A, B");
    assert_eq!(track.album_art.as_deref(), Some("https://i.scdn.co/image/1"));
}

/// Validates that a denied authorization surfaces as a provider error and
/// stores nothing.
#[tokio::test]
async fn test_denied_login_stores_nothing() {
    let mut harness = Harness::new().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&harness.provider)
        .await;

    let durable = Arc::new(MemoryStore::new());
    let ctx = AppContext::with_durable_store(harness.client_config(), durable.clone(), "memory")
        .await
        .unwrap();

    let pending = begin_login(&ctx).await.unwrap();
    harness.start_relay(pending.callback_origin());

    let callback = Url::parse_with_params(
        &format!("{}/callback", harness.relay_url),
        &[("error", "access_denied")],
    )
    .unwrap();
    tokio::spawn(async move { reqwest::get(callback).await });

    let result = pending.finish(&ctx, Duration::from_secs(10)).await;
    assert_eq!(result, Err(NowPlayingError::ProviderAuthorization("access_denied".to_string())));

    let report = status(&ctx).await.unwrap();
    assert_eq!(report.state, LifecycleState::Unauthenticated);
    assert!(!report.pending_login);
    assert!(durable.get(TOKEN_SET_KEY).await.unwrap().is_none());
}

/// Validates that an abandoned login times out as a network error.
#[tokio::test]
async fn test_login_times_out_without_callback() {
    let harness = Harness::new().await;
    let ctx = AppContext::with_durable_store(
        harness.client_config(),
        Arc::new(MemoryStore::new()),
        "memory",
    )
    .await
    .unwrap();

    let pending = begin_login(&ctx).await.unwrap();
    let result = pending.finish(&ctx, Duration::from_millis(50)).await;

    assert!(matches!(result, Err(NowPlayingError::Network(_))));
}
