//! CLI command implementations
//!
//! Each command works against an [`AppContext`](crate::AppContext) and
//! returns plain data; printing is left to the binary.

pub mod login;
pub mod logout;
pub mod status;
pub mod watch;

pub use login::{begin_login, PendingLogin};
pub use logout::logout;
pub use status::{status, StatusReport};
pub use watch::{watch, WatchExit};
