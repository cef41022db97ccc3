//! Testing utilities and helpers
//!
//! - **[`mocks`]**: mock token exchanger
//!
//! [`MemoryStore`] is re-exported here for test code that wants a fake
//! durable store.

pub mod mocks;

pub use mocks::MockTokenExchanger;

pub use crate::auth::MemoryStore;
