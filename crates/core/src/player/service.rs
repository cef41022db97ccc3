//! Now-playing service - one poll step

use std::sync::Arc;

use nowplaying_domain::{LifecycleState, NowPlayingError, Track};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::ports::{AccessTokenSource, NowPlayingProvider};

/// Result of a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Fetch succeeded; `None` when nothing is playing.
    Track(Option<Track>),
    /// Fetch failed for a reason other than authorization; retry next tick.
    Transient(NowPlayingError),
    /// Token is gone (401, failed refresh, or never logged in); stop polling.
    Stopped,
}

/// Now-playing service
pub struct NowPlayingService {
    tokens: Arc<dyn AccessTokenSource>,
    provider: Arc<dyn NowPlayingProvider>,
}

impl NowPlayingService {
    /// Create a new now-playing service
    pub fn new(tokens: Arc<dyn AccessTokenSource>, provider: Arc<dyn NowPlayingProvider>) -> Self {
        Self { tokens, provider }
    }

    /// Validate-or-refresh, then fetch once.
    ///
    /// The token is read fresh from the source on every call. A 401 from the
    /// provider invalidates the token source before returning `Stopped`.
    pub async fn poll_once(&self) -> PollOutcome {
        let access_token = match self.tokens.access_token().await {
            Ok(token) => token,
            Err(err) if err.is_unauthorized() => {
                debug!(error = %err, "No usable access token; stopping poll");
                return PollOutcome::Stopped;
            }
            Err(err) => {
                warn!(error = %err, "Could not obtain access token");
                return PollOutcome::Transient(err);
            }
        };

        match self.provider.currently_playing(&access_token).await {
            Ok(track) => PollOutcome::Track(track),
            Err(err) if err.is_unauthorized() => {
                warn!("Provider rejected access token");
                if let Err(teardown) = self.tokens.invalidate().await {
                    warn!(error = %teardown, "Failed to clear stores after 401");
                }
                PollOutcome::Stopped
            }
            Err(err) => {
                warn!(error = %err, label = err.label(), "Now-playing fetch failed; will retry");
                PollOutcome::Transient(err)
            }
        }
    }

    /// Lifecycle transitions of the underlying token source.
    pub fn lifecycle(&self) -> watch::Receiver<LifecycleState> {
        self.tokens.subscribe()
    }
}
