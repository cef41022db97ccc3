//! Integration tests for the poll step over a real token manager.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nowplaying_common::auth::{KeyValueStore, MemoryStore, TokenManager, TokenSet, TokenStore};
use nowplaying_common::testing::MockTokenExchanger;
use nowplaying_core::{NowPlayingProvider, NowPlayingService, PollOutcome};
use nowplaying_domain::constants::{CODE_VERIFIER_KEY, TOKEN_SET_KEY};
use nowplaying_domain::{LifecycleState, NowPlayingError, Result, Track};

struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<Option<Track>>>>,
    seen_tokens: Mutex<Vec<String>>,
}

#[async_trait]
impl NowPlayingProvider for ScriptedProvider {
    async fn currently_playing(&self, access_token: &str) -> Result<Option<Track>> {
        self.seen_tokens.lock().unwrap().push(access_token.to_string());
        self.responses.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }
}

fn track() -> Track {
    Track {
        name: "Song".to_string(),
        artist: "Artist".to_string(),
        album: "Album".to_string(),
        album_art: Some("https://i.scdn.co/image/1".to_string()),
        is_playing: true,
    }
}

/// Validates the valid → 401 sequence end to end.
///
/// # Test Steps
/// 1. Poll once with a valid token and receive a track
/// 2. Poll again; the provider answers 401
/// 3. Verify the manager is `Invalid` and both stores are empty
/// 4. Verify a third poll stops without contacting the provider
#[tokio::test]
async fn test_valid_then_unauthorized_tears_down() {
    let durable = MemoryStore::new();
    let session = MemoryStore::new();
    let manager = Arc::new(TokenManager::new(
        Arc::new(MockTokenExchanger::new()),
        TokenStore::new(Arc::new(durable.clone()), Arc::new(session.clone())),
        0,
    ));
    manager
        .store_tokens(TokenSet::new("AT1".to_string(), Some("RT1".to_string()), 3600, None))
        .await
        .unwrap();
    session.set(CODE_VERIFIER_KEY, "V1").await.unwrap();

    let provider = Arc::new(ScriptedProvider {
        responses: Mutex::new(
            vec![Ok(Some(track())), Err(NowPlayingError::Unauthorized("revoked".into()))].into(),
        ),
        seen_tokens: Mutex::new(Vec::new()),
    });
    let service = NowPlayingService::new(manager.clone(), provider.clone());

    assert_eq!(service.poll_once().await, PollOutcome::Track(Some(track())));
    assert_eq!(service.poll_once().await, PollOutcome::Stopped);

    assert_eq!(manager.state(), LifecycleState::Invalid);
    assert!(durable.get(TOKEN_SET_KEY).await.unwrap().is_none());
    assert!(session.get(CODE_VERIFIER_KEY).await.unwrap().is_none());

    assert_eq!(service.poll_once().await, PollOutcome::Stopped);
    assert_eq!(provider.seen_tokens.lock().unwrap().len(), 2);
}

/// Validates that an expired token is refreshed before the fetch is issued.
#[tokio::test]
async fn test_refresh_happens_before_fetch() {
    let exchanger = Arc::new(MockTokenExchanger::new());
    let manager = Arc::new(TokenManager::new(
        exchanger.clone(),
        TokenStore::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new())),
        0,
    ));
    let mut stale = TokenSet::new("AT1".to_string(), Some("RT1".to_string()), 3600, None);
    stale.expires_at = Some(chrono::Utc::now() - chrono::Duration::seconds(1));
    manager.store_tokens(stale).await.unwrap();

    let provider = Arc::new(ScriptedProvider {
        responses: Mutex::new(VecDeque::new()),
        seen_tokens: Mutex::new(Vec::new()),
    });
    let service = NowPlayingService::new(manager, provider.clone());

    assert_eq!(service.poll_once().await, PollOutcome::Track(None));
    assert_eq!(exchanger.refresh_calls(), 1);
    assert_eq!(
        *provider.seen_tokens.lock().unwrap(),
        vec!["refreshed_access_token".to_string()]
    );
}
