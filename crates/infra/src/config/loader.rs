//! Configuration loader
//!
//! Loads relay and client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables (relay)
//! - `SPOTIFY_CLIENT_ID`: Provider application id (required)
//! - `SPOTIFY_CLIENT_SECRET`: Provider application secret (optional)
//! - `SPOTIFY_REDIRECT_URI`: Callback URL registered with the provider
//!   (required)
//! - `CLIENT_APP_URL`: Client application origin (CORS and redirects)
//! - `PORT`: Listening port
//! - `SPOTIFY_SCOPES`: Space-separated scopes
//! - `SPOTIFY_ACCOUNTS_URL` / `SPOTIFY_API_URL`: Provider base URLs
//!
//! ## Environment Variables (client)
//! - `NOWPLAYING_RELAY_URL`: Base URL of the relay
//! - `CLIENT_APP_URL`: Origin the relay forwards the callback to
//! - `NOWPLAYING_POLL_INTERVAL_SECS`: Poll interval in seconds
//! - `NOWPLAYING_REFRESH_THRESHOLD_SECS`: Refresh this long before expiry
//! - `NOWPLAYING_DATA_DIR`: Directory of the durable token file
//! - `NOWPLAYING_STORE`: `file` or `keychain`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./nowplaying.json` or `./nowplaying.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use nowplaying_domain::constants::{
    DEFAULT_CLIENT_ORIGIN, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_PORT,
    DEFAULT_REFRESH_THRESHOLD_SECS, DEFAULT_RELAY_URL, DEFAULT_SCOPES, SPOTIFY_ACCOUNTS_URL,
    SPOTIFY_API_URL,
};
use nowplaying_domain::{
    ClientConfig, Config, NowPlayingError, Result, ServerConfig, SpotifyConfig, StoreBackend,
};
use serde::de::DeserializeOwned;

/// Load relay configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `NowPlayingError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load relay configuration from environment variables
///
/// `SPOTIFY_CLIENT_ID` and `SPOTIFY_REDIRECT_URI` are required; everything
/// else falls back to defaults.
///
/// # Errors
/// Returns `NowPlayingError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let client_id = env_var("SPOTIFY_CLIENT_ID")?;
    let redirect_uri = env_var("SPOTIFY_REDIRECT_URI")?;
    let client_secret = env_opt("SPOTIFY_CLIENT_SECRET");

    let scopes = env_opt("SPOTIFY_SCOPES")
        .map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_else(|| DEFAULT_SCOPES.iter().map(|s| (*s).to_string()).collect());

    let port = env_parse("PORT", DEFAULT_PORT)?;
    let client_origin =
        env_opt("CLIENT_APP_URL").unwrap_or_else(|| DEFAULT_CLIENT_ORIGIN.to_string());

    let config = Config {
        spotify: SpotifyConfig {
            client_id,
            client_secret,
            redirect_uri,
            scopes,
            accounts_url: env_opt("SPOTIFY_ACCOUNTS_URL")
                .unwrap_or_else(|| SPOTIFY_ACCOUNTS_URL.to_string()),
            api_url: env_opt("SPOTIFY_API_URL").unwrap_or_else(|| SPOTIFY_API_URL.to_string()),
        },
        server: ServerConfig { port, client_origin },
    };

    config.validate()?;
    Ok(config)
}

/// Load relay configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `NowPlayingError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(NowPlayingError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            NowPlayingError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| NowPlayingError::Config(format!("Failed to read config file: {}", e)))?;

    let config: Config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Load client configuration
///
/// Every field has a default, so this only fails on malformed values.
///
/// # Errors
/// Returns `NowPlayingError::Config` for unparsable numbers or an unknown
/// store backend.
pub fn load_client_config() -> Result<ClientConfig> {
    let store = match env_opt("NOWPLAYING_STORE") {
        Some(raw) => StoreBackend::from_str(&raw).map_err(NowPlayingError::Config)?,
        None => StoreBackend::default(),
    };

    let poll_interval_seconds =
        env_parse("NOWPLAYING_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
    if poll_interval_seconds == 0 {
        return Err(NowPlayingError::Config(
            "NOWPLAYING_POLL_INTERVAL_SECS must be at least 1".to_string(),
        ));
    }

    Ok(ClientConfig {
        relay_url: env_opt("NOWPLAYING_RELAY_URL").unwrap_or_else(|| DEFAULT_RELAY_URL.to_string()),
        client_origin: env_opt("CLIENT_APP_URL")
            .unwrap_or_else(|| DEFAULT_CLIENT_ORIGIN.to_string()),
        poll_interval_seconds,
        refresh_threshold_seconds: env_parse(
            "NOWPLAYING_REFRESH_THRESHOLD_SECS",
            DEFAULT_REFRESH_THRESHOLD_SECS,
        )?,
        data_dir: env_opt("NOWPLAYING_DATA_DIR"),
        store,
    })
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `NowPlayingError::Config` if format is invalid or parsing fails.
fn parse_config<T: DeserializeOwned>(contents: &str, path: &Path) -> Result<T> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| NowPlayingError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| NowPlayingError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(NowPlayingError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./config.{json,toml}`,
///    `./nowplaying.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("nowplaying.json"),
        dir.join("nowplaying.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Get required environment variable
///
/// # Errors
/// Returns `NowPlayingError::Config` if the variable is not set or blank.
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        NowPlayingError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Optional environment variable; blank values count as unset.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| NowPlayingError::Config(format!("Invalid value for {}: {}", key, e))),
        None => Ok(default),
    }
}
