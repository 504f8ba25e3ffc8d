//! Watch-time accrual timer.
//!
//! Runs a periodic one-second tick while a video is in the playing state;
//! pausing halts the tick without losing the accrued count. On teardown the
//! accrued-but-unpersisted seconds are flushed through
//! [`LibraryService::add_watch_time`] exactly once: either by
//! [`WatchTimer::finish`] or, as a fallback, by the drop handler.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use repflow_domain::constants::WATCH_TICK_SECS;
use repflow_domain::Result;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::store::LibraryService;

/// Accrues whole seconds of watch time for one entry while playing.
pub struct WatchTimer {
    store: Arc<LibraryService>,
    entry_id: String,
    accrued: Arc<AtomicU64>,
    playing: Arc<AtomicBool>,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl WatchTimer {
    /// Start a timer for the given entry with the standard one-second tick.
    /// The timer starts paused; call [`set_playing`](Self::set_playing).
    #[must_use]
    pub fn spawn(store: Arc<LibraryService>, entry_id: impl Into<String>) -> Self {
        Self::with_tick(store, entry_id, Duration::from_secs(WATCH_TICK_SECS))
    }

    /// Start a timer with a custom tick interval.
    #[must_use]
    pub fn with_tick(
        store: Arc<LibraryService>,
        entry_id: impl Into<String>,
        tick: Duration,
    ) -> Self {
        let accrued = Arc::new(AtomicU64::new(0));
        let playing = Arc::new(AtomicBool::new(false));
        let cancellation = CancellationToken::new();

        let handle = tokio::spawn(Self::tick_loop(
            tick,
            Arc::clone(&accrued),
            Arc::clone(&playing),
            cancellation.clone(),
        ));

        Self {
            store,
            entry_id: entry_id.into(),
            accrued,
            playing,
            cancellation,
            task_handle: Some(handle),
        }
    }

    async fn tick_loop(
        tick: Duration,
        accrued: Arc<AtomicU64>,
        playing: Arc<AtomicBool>,
        cancel: CancellationToken,
    ) {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick of a fresh interval completes immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("watch tick loop cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if playing.load(Ordering::SeqCst) {
                        accrued.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }
        }
    }

    /// Transition the playing state; seconds accrue only while playing.
    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::SeqCst);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    /// Seconds accrued in this viewing session and not yet flushed.
    pub fn session_seconds(&self) -> u64 {
        self.accrued.load(Ordering::SeqCst)
    }

    /// Discard the accrued-but-unflushed seconds.
    pub fn reset(&self) {
        self.accrued.store(0, Ordering::SeqCst);
    }

    /// Stop the tick and flush the accrued seconds exactly once.
    ///
    /// Zero accrued seconds issue no write at all.
    ///
    /// # Errors
    ///
    /// Propagates the persistence failure from the underlying
    /// `add_watch_time` call.
    pub async fn finish(mut self) -> Result<()> {
        self.cancellation.cancel();
        if let Some(handle) = self.task_handle.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "Watch tick task panicked");
            }
        }

        let seconds = self.accrued.swap(0, Ordering::SeqCst);
        if seconds == 0 {
            return Ok(());
        }

        debug!(entry_id = %self.entry_id, seconds, "Flushing watch time");
        self.store.add_watch_time(&self.entry_id, seconds).await
    }
}

impl Drop for WatchTimer {
    fn drop(&mut self) {
        self.cancellation.cancel();

        // The swap hands the unflushed count to exactly one flusher; after
        // a completed finish() it reads zero here.
        let seconds = self.accrued.swap(0, Ordering::SeqCst);
        if seconds == 0 {
            return;
        }

        warn!(
            entry_id = %self.entry_id,
            seconds,
            "WatchTimer dropped with unflushed seconds; flushing in background"
        );
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let store = Arc::clone(&self.store);
                let entry_id = self.entry_id.clone();
                runtime.spawn(async move {
                    if let Err(err) = store.add_watch_time(&entry_id, seconds).await {
                        warn!(error = %err, "Background watch-time flush failed");
                    }
                });
            }
            Err(_) => {
                warn!("No runtime available; dropping unflushed watch seconds");
            }
        }
    }
}
