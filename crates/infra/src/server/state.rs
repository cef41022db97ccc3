//! Shared handler state

use std::sync::Arc;

use nowplaying_common::auth::{OAuthClient, TokenExchanger};
use nowplaying_core::NowPlayingProvider;
use nowplaying_domain::{Config, NowPlayingError, Result};

use crate::integrations::spotify::SpotifyPlayerClient;

/// Relay state cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub exchanger: Arc<dyn TokenExchanger>,
    pub player: Arc<dyn NowPlayingProvider>,
}

impl AppState {
    pub fn new(
        config: Config,
        exchanger: Arc<dyn TokenExchanger>,
        player: Arc<dyn NowPlayingProvider>,
    ) -> Self {
        Self { config: Arc::new(config), exchanger, player }
    }

    /// Wire the provider token client and player client from configuration.
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let exchanger = OAuthClient::new(config.spotify.clone()).map_err(NowPlayingError::from)?;
        let player = SpotifyPlayerClient::new(&config.spotify)?;
        Ok(Self::new(config, Arc::new(exchanger), Arc::new(player)))
    }
}
