use std::time::Duration;

use nowplaying_common::auth::TokenSet;
use nowplaying_domain::{NowPlayingError, Result};
use nowplaying_infra::CallbackListener;
use tracing::{info, warn};
use url::Url;

use crate::AppContext;

/// A login waiting for the browser round trip.
///
/// The verifier is already stored; the caller shows [`PendingLogin::url`]
/// and then calls [`PendingLogin::finish`].
pub struct PendingLogin {
    pub url: Url,
    listener: CallbackListener,
}

/// Start the callback listener on the client origin, then start the login.
///
/// The listener is bound first so a fast redirect cannot arrive before
/// anything is listening.
///
/// # Errors
/// - `Network` when the client origin cannot be bound
/// - `Storage` when the verifier cannot be stored
pub async fn begin_login(ctx: &AppContext) -> Result<PendingLogin> {
    let listener = CallbackListener::bind(&ctx.config.client_origin).await?;
    let url = ctx.oauth.start_login().await.map_err(NowPlayingError::from)?;
    Ok(PendingLogin { url, listener })
}

impl PendingLogin {
    /// Address the listener actually bound.
    pub fn callback_origin(&self) -> String {
        self.listener.origin()
    }

    /// Wait for the forwarded callback and exchange the code.
    ///
    /// # Errors
    /// - `Network` on timeout
    /// - `ProviderAuthorization` when the user denied access
    /// - the exchange failure otherwise
    pub async fn finish(mut self, ctx: &AppContext, timeout: Duration) -> Result<TokenSet> {
        let waited = self.listener.wait_for_callback(timeout).await;
        if let Err(err) = self.listener.shutdown().await {
            warn!(error = %err, "Callback listener did not shut down cleanly");
        }

        let callback = waited?;

        let tokens = ctx.oauth.complete_login(callback).await.map_err(NowPlayingError::from)?;
        info!(expires_in = tokens.expires_in, "Login finished");
        Ok(tokens)
    }
}
