//! # NowPlaying Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Configuration loading (environment, JSON/TOML files)
//! - HTTP client with retry semantics
//! - File-backed durable token storage
//! - Spotify player and relay clients
//! - The axum relay server and the loopback callback listener
//! - The now-playing scheduler
//!
//! ## Architecture
//! - Implements traits defined in `nowplaying-core` and `nowplaying-common`
//! - Contains all "impure" code (I/O, sockets, timers)

pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod scheduling;
pub mod server;
pub mod storage;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::HttpClient;
pub use integrations::spotify::{
    CallbackListener, RelayPlayerClient, RelayTokenClient, SpotifyPlayerClient,
};
pub use scheduling::{NowPlayingScheduler, NowPlayingSchedulerConfig, SchedulerError};
pub use server::{build_router, AppState};
pub use storage::FileStore;
