//! Scheduling infrastructure
//!
//! The now-playing scheduler follows the same runtime rules as every
//! background task here:
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Timeout on joining the task

pub mod error;
pub mod now_playing_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use now_playing_scheduler::{NowPlayingScheduler, NowPlayingSchedulerConfig};
