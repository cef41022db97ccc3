use std::fmt;

use nowplaying_domain::{LifecycleState, NowPlayingError, Result};

use crate::AppContext;

/// Snapshot of the client's authorization state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub state: LifecycleState,
    pub seconds_until_expiry: Option<i64>,
    pub has_refresh_token: bool,
    pub pending_login: bool,
    pub relay_url: String,
    pub durable_location: String,
}

/// Read the lifecycle state without touching the network.
///
/// # Errors
/// Returns `Storage` if the session store cannot be read.
pub async fn status(ctx: &AppContext) -> Result<StatusReport> {
    let manager = ctx.oauth.token_manager();
    let tokens = manager.get_tokens().await;

    Ok(StatusReport {
        state: manager.state(),
        seconds_until_expiry: manager.seconds_until_expiry().await,
        has_refresh_token: tokens.as_ref().is_some_and(|t| t.refresh_token.is_some()),
        pending_login: ctx.oauth.has_pending_login().await.map_err(NowPlayingError::from)?,
        relay_url: ctx.config.relay_url.clone(),
        durable_location: ctx.durable_location.clone(),
    })
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "state:          {}", self.state)?;
        match self.seconds_until_expiry {
            Some(secs) if secs > 0 => writeln!(f, "expires in:     {secs}s")?,
            Some(_) => writeln!(f, "expires in:     expired")?,
            None => writeln!(f, "expires in:     -")?,
        }
        writeln!(f, "refresh token:  {}", if self.has_refresh_token { "yes" } else { "no" })?;
        writeln!(f, "relay:          {}", self.relay_url)?;
        write!(f, "token store:    {}", self.durable_location)
    }
}
