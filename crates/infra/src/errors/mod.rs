//! Infrastructure error handling
//!
//! Conversions from third-party error types into `NowPlayingError` live here
//! so the domain crate stays free of I/O dependencies.

pub mod conversions;

pub use conversions::InfraError;
