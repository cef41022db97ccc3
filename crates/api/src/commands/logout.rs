use nowplaying_domain::{NowPlayingError, Result};
use tracing::info;

use crate::AppContext;

/// Clear the durable token record and the session verifier.
///
/// # Errors
/// Returns `Storage` if either store cannot be cleared.
pub async fn logout(ctx: &AppContext) -> Result<()> {
    ctx.oauth.logout().await.map_err(NowPlayingError::from)?;
    info!(store = %ctx.durable_location, "Logged out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use nowplaying_common::auth::{KeyValueStore, MemoryStore, TokenSet};
    use nowplaying_domain::constants::TOKEN_SET_KEY;
    use nowplaying_domain::{ClientConfig, LifecycleState};

    use super::*;

    #[tokio::test]
    async fn logout_clears_durable_record() {
        let durable = Arc::new(MemoryStore::new());
        let ctx =
            AppContext::with_durable_store(ClientConfig::default(), durable.clone(), "memory")
                .await
                .unwrap();
        ctx.oauth
            .token_manager()
            .store_tokens(TokenSet::new("AT".into(), Some("RT".into()), 3600, None))
            .await
            .unwrap();
        assert!(durable.get(TOKEN_SET_KEY).await.unwrap().is_some());

        logout(&ctx).await.unwrap();

        assert!(durable.get(TOKEN_SET_KEY).await.unwrap().is_none());
        assert_eq!(ctx.oauth.token_manager().state(), LifecycleState::Unauthenticated);
    }
}
