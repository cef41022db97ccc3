//! Router assembly

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use nowplaying_domain::{NowPlayingError, Result};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Build the relay router with CORS restricted to the client origin.
///
/// # Errors
/// `Config` if the client origin is not a valid header value.
pub fn build_router(state: AppState) -> Result<Router> {
    let cors = cors_layer(&state.config.server.client_origin)?;

    Ok(Router::new()
        .route("/login", get(handlers::login))
        .route("/callback", get(handlers::callback))
        .route("/exchange-token", post(handlers::exchange_token))
        .route("/refresh-token", post(handlers::refresh_token))
        .route("/current-track", get(handlers::current_track))
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

fn cors_layer(client_origin: &str) -> Result<CorsLayer> {
    // Browsers send the origin without a trailing slash.
    let origin = HeaderValue::from_str(client_origin.trim_end_matches('/')).map_err(|e| {
        NowPlayingError::Config(format!("invalid client origin {client_origin}: {e}"))
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}
