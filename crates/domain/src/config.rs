//! Configuration structures
//!
//! Values are supplied externally (environment or config file); see the
//! loader in `nowplaying-infra` for the variable names.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CLIENT_ORIGIN, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_PORT,
    DEFAULT_REFRESH_THRESHOLD_SECS, DEFAULT_RELAY_URL, DEFAULT_SCOPES, SPOTIFY_ACCOUNTS_URL,
    SPOTIFY_API_URL, SPOTIFY_AUTHORIZE_PATH, SPOTIFY_CURRENTLY_PLAYING_PATH, SPOTIFY_TOKEN_PATH,
};
use crate::errors::{NowPlayingError, Result};
use crate::impl_domain_status_conversions;

/// Relay configuration (server side).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Reject configurations the relay cannot run with.
    ///
    /// # Errors
    /// Returns `NowPlayingError::Config` naming the first empty field.
    pub fn validate(&self) -> Result<()> {
        require_non_empty("spotify.client_id", &self.spotify.client_id)?;
        require_non_empty("spotify.redirect_uri", &self.spotify.redirect_uri)?;
        require_non_empty("server.client_origin", &self.server.client_origin)?;
        if self.spotify.scopes.is_empty() {
            return Err(NowPlayingError::Config("spotify.scopes must not be empty".into()));
        }
        Ok(())
    }
}

/// Provider application credentials and endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    pub client_id: String,
    /// Confidential secret. When absent the exchange is sent as a public
    /// PKCE client (client_id only, no Basic auth).
    #[serde(default, skip_serializing)]
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_accounts_url")]
    pub accounts_url: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl SpotifyConfig {
    #[must_use]
    pub fn authorize_endpoint(&self) -> String {
        format!("{}{}", self.accounts_url.trim_end_matches('/'), SPOTIFY_AUTHORIZE_PATH)
    }

    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!("{}{}", self.accounts_url.trim_end_matches('/'), SPOTIFY_TOKEN_PATH)
    }

    #[must_use]
    pub fn currently_playing_endpoint(&self) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), SPOTIFY_CURRENTLY_PLAYING_PATH)
    }

    /// Scopes as the space-separated string the provider expects.
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

/// HTTP listener settings for the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origin of the client application; used for CORS and for the callback
    /// redirect target.
    #[serde(default = "default_client_origin")]
    pub client_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT, client_origin: default_client_origin() }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

/// Durable token storage backend used by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Keychain,
}

impl_domain_status_conversions!(StoreBackend {
    File => "file",
    Keychain => "keychain",
});

/// Client application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    /// Where the relay forwards `?code=` / `?error=` to.
    #[serde(default = "default_client_origin")]
    pub client_origin: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_refresh_threshold")]
    pub refresh_threshold_seconds: i64,
    /// Directory for the durable token file. `None` uses the platform data
    /// directory.
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub store: StoreBackend,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            client_origin: default_client_origin(),
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECS,
            refresh_threshold_seconds: DEFAULT_REFRESH_THRESHOLD_SECS,
            data_dir: None,
            store: StoreBackend::default(),
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(NowPlayingError::Config(format!("{field} must not be empty")));
    }
    Ok(())
}

fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| (*s).to_string()).collect()
}

fn default_accounts_url() -> String {
    SPOTIFY_ACCOUNTS_URL.to_string()
}

fn default_api_url() -> String {
    SPOTIFY_API_URL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_client_origin() -> String {
    DEFAULT_CLIENT_ORIGIN.to_string()
}

fn default_relay_url() -> String {
    DEFAULT_RELAY_URL.to_string()
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_refresh_threshold() -> i64 {
    DEFAULT_REFRESH_THRESHOLD_SECS
}
