//! Spotify integration
//!
//! Provides:
//! - The currently-playing client used by the relay (`SpotifyPlayerClient`)
//! - Relay clients used by the CLI (`RelayTokenClient`, `RelayPlayerClient`)
//! - The loopback listener that receives the forwarded callback
//!   (`CallbackListener`)

pub mod loopback;
pub mod player;
pub mod relay_client;
pub mod types;

pub use loopback::CallbackListener;
pub use player::SpotifyPlayerClient;
pub use relay_client::{RelayPlayerClient, RelayTokenClient};
pub use types::CurrentlyPlayingResponse;
