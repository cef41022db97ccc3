//! # NowPlaying Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the playback provider and the token source
//! - The poll step shared by every scheduler
//!
//! ## Architecture Principles
//! - Only depends on `nowplaying-common` and `nowplaying-domain`
//! - No HTTP or storage code
//! - All external dependencies via traits

pub mod player;

pub use player::ports::{AccessTokenSource, NowPlayingProvider};
pub use player::{NowPlayingService, PollOutcome};
