//! Currently-playing polling
//!
//! This module provides the ports a poll depends on and the service that
//! performs one poll step.

pub mod ports;
pub mod service;

pub use ports::{AccessTokenSource, NowPlayingProvider};
pub use service::{NowPlayingService, PollOutcome};
