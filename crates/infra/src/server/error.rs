//! Relay error responses
//!
//! Every handler error is rendered as `{error, details}` with the status the
//! domain error maps to.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nowplaying_common::auth::ErrorBody;
use nowplaying_domain::NowPlayingError;
use tracing::warn;

/// Handler error wrapper.
#[derive(Debug)]
pub struct ApiError(pub NowPlayingError);

impl<E> From<E> for ApiError
where
    E: Into<NowPlayingError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            NowPlayingError::MissingParameter(_)
            | NowPlayingError::InvalidInput(_)
            | NowPlayingError::ProviderAuthorization(_) => StatusCode::BAD_REQUEST,
            NowPlayingError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            NowPlayingError::ExchangeFailed { status, .. }
            | NowPlayingError::Upstream { status, .. } => provider_status(*status),
            NowPlayingError::Network(_)
            | NowPlayingError::Config(_)
            | NowPlayingError::Storage(_)
            | NowPlayingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let details = match &self.0 {
            NowPlayingError::MissingParameter(name) => name.clone(),
            NowPlayingError::ExchangeFailed { body, .. }
            | NowPlayingError::Upstream { body, .. } => body.clone(),
            NowPlayingError::Unauthorized(message)
            | NowPlayingError::ProviderAuthorization(message)
            | NowPlayingError::InvalidInput(message) => message.clone(),
            other => other.to_string(),
        };
        ErrorBody { error: self.0.label().to_string(), details: Some(details) }
    }
}

/// Provider status propagated verbatim; 500 when it is not a usable error
/// status.
fn provider_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status)
        .ok()
        .filter(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), label = self.0.label(), "Request failed");
        }
        (status, Json(self.body())).into_response()
    }
}
