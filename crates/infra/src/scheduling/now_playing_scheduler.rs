//! Now-playing scheduler
//!
//! Runs [`NowPlayingService::poll_once`] on a fixed interval and publishes
//! the latest `Option<Track>` on a watch channel.
//!
//! The loop stops on its own when the token lifecycle leaves the usable
//! states (401 teardown, failed refresh, logout), and on [`stop`]. Ticks
//! never overlap: each poll completes before the next tick is awaited, and
//! ticks missed during a slow poll are skipped.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use nowplaying_core::NowPlayingService;
//! use nowplaying_infra::scheduling::{NowPlayingScheduler, NowPlayingSchedulerConfig};
//!
//! # async fn example(service: Arc<NowPlayingService>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut scheduler = NowPlayingScheduler::new(service, NowPlayingSchedulerConfig::default());
//! let mut tracks = scheduler.subscribe();
//!
//! scheduler.start().await?;
//! while tracks.changed().await.is_ok() {
//!     println!("{:?}", *tracks.borrow());
//! }
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`stop`]: NowPlayingScheduler::stop

use std::sync::Arc;
use std::time::Duration;

use nowplaying_core::{NowPlayingService, PollOutcome};
use nowplaying_domain::constants::DEFAULT_POLL_INTERVAL_SECS;
use nowplaying_domain::Track;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the now-playing scheduler
#[derive(Debug, Clone)]
pub struct NowPlayingSchedulerConfig {
    /// Time between polls; the first poll runs immediately
    pub interval: Duration,
    /// How long `stop` waits for the poll task to finish
    pub join_timeout: Duration,
}

impl Default for NowPlayingSchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            join_timeout: Duration::from_secs(5),
        }
    }
}

impl NowPlayingSchedulerConfig {
    pub fn with_interval_secs(seconds: u64) -> Self {
        Self { interval: Duration::from_secs(seconds.max(1)), ..Self::default() }
    }
}

/// Periodic now-playing poller
pub struct NowPlayingScheduler {
    service: Arc<NowPlayingService>,
    config: NowPlayingSchedulerConfig,
    tracks: Arc<watch::Sender<Option<Track>>>,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl NowPlayingScheduler {
    pub fn new(service: Arc<NowPlayingService>, config: NowPlayingSchedulerConfig) -> Self {
        let (tracks, _) = watch::channel(None);
        Self {
            service,
            config,
            tracks: Arc::new(tracks),
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Latest track; notified only when the value changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Track>> {
        self.tracks.subscribe()
    }

    /// Start the poll task
    ///
    /// # Errors
    ///
    /// Returns error if the scheduler is already running
    #[instrument(skip(self), fields(interval_secs = self.config.interval.as_secs()))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!("Starting now-playing scheduler");

        // Fresh token so the scheduler can be restarted after stop
        self.cancellation_token = CancellationToken::new();

        let service = Arc::clone(&self.service);
        let tracks = Arc::clone(&self.tracks);
        let interval = self.config.interval;
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::poll_loop(service, tracks, interval, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);
        Ok(())
    }

    /// Stop the poll task and wait for it to finish
    ///
    /// Also succeeds after the loop already stopped itself on an unusable
    /// lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns `NotRunning` if the scheduler was never started, or a timeout
    /// if the task does not finish within the join timeout
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let Some(handle) = self.task_handle.lock().await.take() else {
            return Err(SchedulerError::NotRunning);
        };

        info!("Stopping now-playing scheduler");
        self.cancellation_token.cancel();

        let join_timeout = self.config.join_timeout;
        tokio::time::timeout(join_timeout, handle)
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: join_timeout.as_secs() })?
            .map_err(|e| SchedulerError::TaskJoinFailed(e.to_string()))?;

        info!("Now-playing scheduler stopped");
        Ok(())
    }

    /// Whether the poll task is alive.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Resolves once the loop has stopped, for whatever reason.
    pub async fn stopped(&self) {
        self.cancellation_token.cancelled().await;
    }

    async fn poll_loop(
        service: Arc<NowPlayingService>,
        tracks: Arc<watch::Sender<Option<Track>>>,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        let mut lifecycle = service.lifecycle();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Poll loop cancelled");
                    break;
                }
                changed = lifecycle.changed() => {
                    if changed.is_err() {
                        debug!("Token source dropped; stopping poll loop");
                        break;
                    }
                    let state = *lifecycle.borrow_and_update();
                    if !state.is_usable() {
                        info!(%state, "Token lifecycle left usable state; stopping poll loop");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match service.poll_once().await {
                        PollOutcome::Track(track) => {
                            tracks.send_if_modified(|current| {
                                if *current == track {
                                    false
                                } else {
                                    *current = track;
                                    true
                                }
                            });
                        }
                        PollOutcome::Transient(err) => {
                            debug!(error = %err, "Transient poll failure");
                        }
                        PollOutcome::Stopped => {
                            info!("Poll stopped by token lifecycle");
                            break;
                        }
                    }
                }
            }
        }

        tracks.send_if_modified(|current| current.take().is_some());
        cancel.cancel();
    }
}

impl Drop for NowPlayingScheduler {
    fn drop(&mut self) {
        if !self.cancellation_token.is_cancelled() {
            warn!("NowPlayingScheduler dropped while running; cancelling");
            self.cancellation_token.cancel();
        }
    }
}
