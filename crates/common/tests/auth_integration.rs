//! Integration tests for auth module
//!
//! Drives the full login and token lifecycle: PKCE generation, callback
//! classification, code exchange against a stubbed token endpoint, refresh
//! with carry-forward and 401 teardown.

#![cfg(feature = "test-utils")]

use std::collections::HashMap;
use std::sync::Arc;

use nowplaying_common::auth::{
    build_authorization_url, generate_code_challenge, is_valid_code_verifier, CallbackRelay,
    CallbackState, KeyValueStore, MemoryStore, OAuthClient, OAuthService, PkceChallenge,
    TokenExchanger, TokenManager, TokenManagerError, TokenSet, TokenStore,
};
use nowplaying_common::testing::MockTokenExchanger;
use nowplaying_domain::constants::{CODE_VERIFIER_KEY, TOKEN_SET_KEY};
use nowplaying_domain::{LifecycleState, NowPlayingError, SpotifyConfig};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn spotify_config(accounts_url: &str) -> SpotifyConfig {
    SpotifyConfig {
        client_id: "client123".to_string(),
        client_secret: Some("secret456".to_string()),
        redirect_uri: "http://127.0.0.1:3001/callback".to_string(),
        scopes: vec!["user-read-currently-playing".to_string()],
        accounts_url: accounts_url.to_string(),
        api_url: "http://unused.invalid".to_string(),
    }
}

fn stores() -> (MemoryStore, MemoryStore, TokenStore) {
    let durable = MemoryStore::new();
    let session = MemoryStore::new();
    let store = TokenStore::new(Arc::new(durable.clone()), Arc::new(session.clone()));
    (durable, session, store)
}

/// Validates PKCE challenge generation and format.
///
/// # Test Steps
/// 1. Generate a PKCE pair
/// 2. Verify the verifier length and alphabet
/// 3. Verify the challenge is the S256 transform of the verifier
#[test]
fn test_pkce_challenge_generation() {
    let pkce = PkceChallenge::generate();

    assert!(is_valid_code_verifier(&pkce.code_verifier));
    assert_eq!(pkce.code_verifier.len(), 43);
    assert_eq!(pkce.code_challenge, generate_code_challenge(&pkce.code_verifier));
    assert!(!pkce.code_challenge.ends_with('='));
    assert_eq!(pkce.challenge_method(), "S256");
}

/// Validates the relay's half of a login: the provider URL embeds the
/// challenge and the callback forwards the code untouched.
#[test]
fn test_relay_authorize_and_callback_round() {
    let pkce = PkceChallenge::generate();
    let url = build_authorization_url(
        "https://accounts.spotify.com/authorize",
        &pkce.code_challenge,
        "client123",
        "http://127.0.0.1:3001/callback",
        "user-read-currently-playing",
    )
    .expect("authorization url");
    let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
    assert_eq!(params["code_challenge"], pkce.code_challenge);

    let mut relay = CallbackRelay::new();
    relay.receive(Some("XYZ"), None);
    let forwarded = relay.forward_url("http://127.0.0.1:5173").unwrap().unwrap();
    assert_eq!(forwarded.query(), Some("code=XYZ"));
}

/// Validates the exchange against a stubbed provider.
///
/// Code `XYZ` and verifier `V1` against a stub answering
/// `{AT1, 3600, RT1}` produce `TokenSet{AT1, RT1, now+3600}`.
#[tokio::test]
async fn test_exchange_against_stub_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("code=XYZ"))
        .and(body_string_contains("code_verifier=V1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "AT1",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "RT1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OAuthClient::new(spotify_config(&server.uri())).unwrap();
    let tokens = client.exchange("XYZ", "V1").await.unwrap();

    assert_eq!(tokens.access_token, "AT1");
    assert_eq!(tokens.refresh_token.as_deref(), Some("RT1"));
    let remaining = tokens.seconds_until_expiry().unwrap();
    assert!((3595..=3600).contains(&remaining));
}

/// Validates that an exchange with an empty verifier never reaches the
/// provider.
#[tokio::test]
async fn test_exchange_missing_verifier_never_hits_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = OAuthClient::new(spotify_config(&server.uri())).unwrap();
    let err = client.exchange("XYZ", "").await.unwrap_err();

    assert_eq!(err, NowPlayingError::MissingParameter("code_verifier".to_string()));
}

/// Validates the full lifecycle through the provider client: login, expiry,
/// refresh with an omitted refresh token, then 401 teardown.
#[tokio::test]
async fn test_lifecycle_with_provider_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "AT2",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (durable, session, store) = stores();
    let client = Arc::new(OAuthClient::new(spotify_config(&server.uri())).unwrap());
    let manager = TokenManager::new(client, store, 0);

    let mut stale = TokenSet::new("AT1".to_string(), Some("RT1".to_string()), 3600, None);
    stale.expires_at = Some(chrono::Utc::now() - chrono::Duration::seconds(5));
    manager.store_tokens(stale).await.unwrap();
    session.set(CODE_VERIFIER_KEY, "leftover").await.unwrap();

    assert_eq!(manager.access_token().await.unwrap(), "AT2");
    let refreshed = manager.get_tokens().await.unwrap();
    assert_eq!(refreshed.refresh_token.as_deref(), Some("RT1"));

    manager.invalidate().await.unwrap();
    assert_eq!(manager.state(), LifecycleState::Invalid);
    assert!(durable.get(TOKEN_SET_KEY).await.unwrap().is_none());
    assert!(session.get(CODE_VERIFIER_KEY).await.unwrap().is_none());
}

/// Validates the application-side login through `OAuthService`.
#[tokio::test]
async fn test_service_login_then_restart_restores_tokens() {
    let exchanger = Arc::new(MockTokenExchanger::new());
    let durable = MemoryStore::new();

    let first = OAuthService::new(
        "http://127.0.0.1:3001",
        exchanger.clone(),
        TokenStore::new(Arc::new(durable.clone()), Arc::new(MemoryStore::new())),
        0,
    );
    first.start_login().await.unwrap();
    first.complete_login(CallbackState::from_query(Some("XYZ"), None)).await.unwrap();

    // Fresh session store, same durable store.
    let second = OAuthService::new(
        "http://127.0.0.1:3001",
        exchanger,
        TokenStore::new(Arc::new(durable), Arc::new(MemoryStore::new())),
        0,
    );
    assert!(second.initialize().await.unwrap());
    assert_eq!(second.get_access_token().await.unwrap(), "AT1");
}

/// Validates that a failing refresh surfaces as logged-out.
#[tokio::test]
async fn test_refresh_failure_is_unauthorized() {
    let exchanger = Arc::new(MockTokenExchanger::new());
    exchanger.set_refresh_response(Err(NowPlayingError::ExchangeFailed {
        status: 400,
        body: "invalid_grant".to_string(),
    }));
    let (_, _, store) = stores();
    let manager = TokenManager::new(exchanger, store, 60);

    // Within the 60 s threshold, so treated as expired.
    manager
        .store_tokens(TokenSet::new("AT1".to_string(), Some("RT1".to_string()), 30, None))
        .await
        .unwrap();

    let err = manager.access_token().await.unwrap_err();
    assert!(matches!(err, TokenManagerError::RefreshFailed(_)));
    assert!(NowPlayingError::from(err).is_unauthorized());
    assert_eq!(manager.state(), LifecycleState::Invalid);
}
