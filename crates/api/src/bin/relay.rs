//! NowPlaying relay - OAuth2 PKCE token relay and now-playing proxy

use anyhow::Context;
use nowplaying_infra::config::load;
use nowplaying_infra::server::serve;
use nowplaying_infra::AppState;
use nowplaying_lib::utils::logging::init_tracing;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so RUST_LOG from it applies to the subscriber
    let dotenv = dotenvy::dotenv();
    init_tracing("info");
    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(e) => warn!("Could not load .env file: {}", e),
    }

    let config = load().context("loading relay configuration")?;
    let bind_address = config.server.bind_address();
    info!(
        client_origin = %config.server.client_origin,
        redirect_uri = %config.spotify.redirect_uri,
        confidential = config.spotify.client_secret.is_some(),
        "Relay configuration loaded"
    );

    let state = AppState::from_config(config).context("building relay state")?;
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("binding {bind_address}"))?;

    serve(listener, state, shutdown_signal()).await.context("serving relay")?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => {
            warn!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
