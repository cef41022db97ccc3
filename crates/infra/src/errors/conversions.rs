//! Conversions from external infrastructure errors into domain errors.

use nowplaying_domain::NowPlayingError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use std::io::Error as IoError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub NowPlayingError);

impl From<InfraError> for NowPlayingError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<NowPlayingError> for InfraError {
    fn from(value: NowPlayingError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoNowPlayingError {
    fn into_nowplaying(self) -> NowPlayingError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → NowPlayingError */
/* -------------------------------------------------------------------------- */

impl IntoNowPlayingError for HttpError {
    fn into_nowplaying(self) -> NowPlayingError {
        if self.is_timeout() {
            return NowPlayingError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return NowPlayingError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 => NowPlayingError::Unauthorized(message),
                _ => NowPlayingError::Upstream { status: code, body: message },
            };
        }

        if self.is_decode() {
            return NowPlayingError::Upstream {
                status: 200,
                body: format!("undecodable response body: {self}"),
            };
        }

        NowPlayingError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_nowplaying())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error / std::io::Error → NowPlayingError */
/* -------------------------------------------------------------------------- */

impl IntoNowPlayingError for JsonError {
    fn into_nowplaying(self) -> NowPlayingError {
        NowPlayingError::Storage(format!("invalid JSON at line {}: {}", self.line(), self))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_nowplaying())
    }
}

impl IntoNowPlayingError for IoError {
    fn into_nowplaying(self) -> NowPlayingError {
        NowPlayingError::Storage(format!("{:?}: {}", self.kind(), self))
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_nowplaying())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
