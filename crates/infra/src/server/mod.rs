//! Relay HTTP server
//!
//! ```text
//! GET  /login           302 → provider authorization URL
//! GET  /callback        302 → client origin ?code= | ?error=
//! POST /exchange-token  {code, code_verifier} → {access_token, expires_in, refresh_token}
//! POST /refresh-token   {refresh_token}       → same shape, refresh token carried forward
//! GET  /current-track   Bearer → Track | 204 | provider status
//! GET  /health          {status: "ok"}
//! ```
//!
//! The relay holds the client secret and never persists tokens.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use std::future::Future;

use nowplaying_domain::{NowPlayingError, Result};
use tokio::net::TcpListener;
use tracing::info;

pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;

/// Serve the relay on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = build_router(state)?;
    let addr = listener
        .local_addr()
        .map_err(|e| NowPlayingError::Network(format!("failed to determine address: {e}")))?;

    info!(%addr, "Relay listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| NowPlayingError::Network(format!("relay server error: {e}")))?;

    info!("Relay stopped");
    Ok(())
}
