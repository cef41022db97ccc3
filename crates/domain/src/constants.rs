//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Provider endpoints
pub const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const SPOTIFY_API_URL: &str = "https://api.spotify.com";
pub const SPOTIFY_AUTHORIZE_PATH: &str = "/authorize";
pub const SPOTIFY_TOKEN_PATH: &str = "/api/token";
pub const SPOTIFY_CURRENTLY_PLAYING_PATH: &str = "/v1/me/player/currently-playing";
pub const DEFAULT_SCOPES: &[&str] = &["user-read-currently-playing", "user-read-playback-state"];

// Relay defaults
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_CLIENT_ORIGIN: &str = "http://127.0.0.1:5173";
pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:3001";
pub const PKCE_CHALLENGE_METHOD: &str = "S256";

// Client-side persisted state
pub const TOKEN_SET_KEY: &str = "spotify_token_set";
pub const CODE_VERIFIER_KEY: &str = "spotify_code_verifier";

// Polling
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

// Refresh when the token is this close to expiry (0 = exactly at expiry)
pub const DEFAULT_REFRESH_THRESHOLD_SECS: i64 = 0;

// Error forwarded to the client origin when the callback carries neither
// `code` nor `error`
pub const MISSING_CODE_ERROR: &str = "missing_code";
