use std::future::Future;

use nowplaying_domain::{NowPlayingError, Result, Track};
use tracing::info;

use crate::AppContext;

/// Why [`watch`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchExit {
    /// The shutdown future resolved.
    Interrupted,
    /// The token lifecycle left the usable states; log in again.
    SessionEnded,
}

/// Run the scheduler and hand every track change to `on_change`.
///
/// `None` means nothing is playing (or the session ended).
///
/// # Errors
/// - `Unauthorized` when there is no usable session to start from
/// - scheduler failures while starting or stopping
pub async fn watch<F, S>(ctx: &AppContext, shutdown: S, mut on_change: F) -> Result<WatchExit>
where
    F: FnMut(Option<&Track>),
    S: Future<Output = ()>,
{
    let state = ctx.oauth.token_manager().state();
    if !state.is_usable() {
        return Err(NowPlayingError::Unauthorized(format!(
            "no usable session ({state}); run `nowplaying login` first"
        )));
    }

    let mut scheduler = ctx.scheduler();
    let mut tracks = scheduler.subscribe();
    scheduler.start().await.map_err(NowPlayingError::from)?;

    tokio::pin!(shutdown);
    let exit = loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break WatchExit::Interrupted,
            _ = scheduler.stopped() => {
                // The poll loop clears the track right before it stops.
                if tracks.has_changed().unwrap_or(false) {
                    let current = tracks.borrow_and_update().clone();
                    on_change(current.as_ref());
                }
                break WatchExit::SessionEnded;
            }
            changed = tracks.changed() => {
                if changed.is_err() {
                    break WatchExit::SessionEnded;
                }
                let current = tracks.borrow_and_update().clone();
                on_change(current.as_ref());
            }
        }
    };

    scheduler.stop().await.map_err(NowPlayingError::from)?;
    info!(?exit, "Watch finished");
    Ok(exit)
}
