//! Relay request handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use nowplaying_common::auth::{
    build_authorization_url, is_valid_code_verifier, CallbackState, ExchangeTokenRequest,
    RefreshTokenRequest, TokenPayload,
};
use nowplaying_domain::constants::PKCE_CHALLENGE_METHOD;
use nowplaying_domain::NowPlayingError;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};
use url::Url;

use super::error::ApiError;
use super::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// 302 with `Location`; axum's `Redirect` only offers 303/307/308.
fn found(url: &Url) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, url.as_str().to_string())]).into_response()
}

fn required(value: Option<String>, name: &str) -> ApiResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError(NowPlayingError::MissingParameter(name.to_string())))
}

/// `GET /login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> ApiResult<Response> {
    let challenge = required(query.code_challenge, "code_challenge")?;
    let method = required(query.code_challenge_method, "code_challenge_method")?;
    if method != PKCE_CHALLENGE_METHOD {
        return Err(ApiError(NowPlayingError::InvalidInput(format!(
            "unsupported code_challenge_method {method}; expected {PKCE_CHALLENGE_METHOD}"
        ))));
    }

    let spotify = &state.config.spotify;
    let url = build_authorization_url(
        &spotify.authorize_endpoint(),
        &challenge,
        &spotify.client_id,
        &spotify.redirect_uri,
        &spotify.scope_string(),
    )?;

    debug!("Redirecting to provider authorization");
    Ok(found(&url))
}

/// `GET /callback`
///
/// Forwards the code or error to the client origin; never redeems the code.
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<Response> {
    let callback = CallbackState::from_query(query.code.as_deref(), query.error.as_deref());
    if let CallbackState::ErrorReceived(error) = &callback {
        info!(error = %error, "Provider returned an authorization error");
    }

    let url = callback
        .forward_url(&state.config.server.client_origin)?
        .ok_or_else(|| ApiError(NowPlayingError::Internal("callback not classified".into())))?;

    Ok(found(&url))
}

/// `POST /exchange-token`
#[instrument(skip_all)]
pub async fn exchange_token(
    State(state): State<AppState>,
    body: Result<Json<ExchangeTokenRequest>, JsonRejection>,
) -> ApiResult<Json<TokenPayload>> {
    let Json(request) = body.map_err(rejection)?;

    if request.code.is_empty() {
        return Err(ApiError(NowPlayingError::MissingParameter("code".to_string())));
    }
    // A malformed verifier is treated the same as an absent one.
    if !is_valid_code_verifier(&request.code_verifier) {
        return Err(ApiError(NowPlayingError::MissingParameter("code_verifier".to_string())));
    }

    let tokens = state.exchanger.exchange(&request.code, &request.code_verifier).await?;
    info!(expires_in = tokens.expires_in, "Authorization code exchanged");
    Ok(Json(TokenPayload::from(&tokens)))
}

/// `POST /refresh-token`
#[instrument(skip_all)]
pub async fn refresh_token(
    State(state): State<AppState>,
    body: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> ApiResult<Json<TokenPayload>> {
    let Json(request) = body.map_err(rejection)?;

    if request.refresh_token.is_empty() {
        return Err(ApiError(NowPlayingError::MissingParameter("refresh_token".to_string())));
    }

    let tokens = state
        .exchanger
        .refresh(&request.refresh_token)
        .await?
        .with_carried_refresh_token(Some(&request.refresh_token));
    info!(expires_in = tokens.expires_in, "Access token refreshed");
    Ok(Json(TokenPayload::from(&tokens)))
}

/// `GET /current-track`
#[instrument(skip_all)]
pub async fn current_track(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let token = bearer_token(&headers)?;

    match state.player.currently_playing(token).await? {
        Some(track) => Ok(Json(track).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn bearer_token(headers: &HeaderMap) -> ApiResult<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError(NowPlayingError::Unauthorized("missing bearer token".to_string())))
}

fn rejection(err: JsonRejection) -> ApiError {
    ApiError(NowPlayingError::InvalidInput(err.body_text()))
}
