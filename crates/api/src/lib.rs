//! # NowPlaying API
//!
//! Application layer - the relay binary, the CLI client and their wiring.
//!
//! This crate contains:
//! - CLI definition and command implementations
//! - Client context (dependency injection)
//! - Tracing setup shared by both binaries
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Binaries: `nowplaying` (client) and `nowplaying-relay` (server)

pub mod cli;
pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use cli::{Cli, Command};
pub use context::*;
