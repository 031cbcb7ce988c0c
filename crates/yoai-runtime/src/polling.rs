//! The polling loop.
//!
//! One logical thread of control: fetch a batch, dispatch it in order, pause,
//! repeat. Failures are contained at three levels:
//!
//! - a failed fetch is reported and the cycle counts as empty
//! - malformed updates and failing handlers are contained by the [`Dispatcher`]
//! - a cycle that unwinds anyway is reported as [`Failure::LoopFatal`] and
//!   followed by the longer cooldown
//!
//! The loop only ends when its [`CancellationToken`] is cancelled (checked
//! before each cycle and during each pause) or when the transport turns out
//! to be misconfigured.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use yoai_core::{TransportError, UpdateSource};
use yoai_framework::{Dispatcher, Failure, panic_message};

use crate::error::{RuntimeError, RuntimeResult};

/// Timing of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingSettings {
    /// Pause after every cycle.
    pub interval: Duration,
    /// Pause after a cycle that failed unexpectedly.
    ///
    /// Never shorter than the interval the loop runs with.
    pub cooldown: Duration,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            cooldown: Duration::from_secs(5),
        }
    }
}

/// Result of a single polling cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The fetch succeeded and this many updates were dispatched.
    Dispatched(usize),
    /// The fetch failed and was reported; nothing was dispatched.
    FetchFailed,
    /// The transport can never succeed.
    Fatal(TransportError),
}

/// Counters kept by a [`Poller`].
#[derive(Debug, Default)]
pub struct PollerStats {
    cycles: AtomicU64,
    updates: AtomicU64,
    fetch_failures: AtomicU64,
    loop_recoveries: AtomicU64,
}

impl PollerStats {
    /// Cycles started.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Updates handed to the dispatcher.
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    /// Fetches that failed.
    pub fn fetch_failures(&self) -> u64 {
        self.fetch_failures.load(Ordering::Relaxed)
    }

    /// Cycles that unwound and were followed by a cooldown.
    pub fn loop_recoveries(&self) -> u64 {
        self.loop_recoveries.load(Ordering::Relaxed)
    }
}

/// Drives an [`UpdateSource`] into a [`Dispatcher`].
pub struct Poller {
    source: Arc<dyn UpdateSource>,
    dispatcher: Dispatcher,
    settings: PollingSettings,
    stats: Arc<PollerStats>,
}

impl Poller {
    /// Creates a poller. Failures go to the dispatcher's sink.
    pub fn new(
        source: Arc<dyn UpdateSource>,
        dispatcher: Dispatcher,
        settings: PollingSettings,
    ) -> Self {
        Self {
            source,
            dispatcher,
            settings,
            stats: Arc::default(),
        }
    }

    /// Shares an existing set of counters.
    pub fn with_stats(mut self, stats: Arc<PollerStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Counters of this poller.
    pub fn stats(&self) -> &Arc<PollerStats> {
        &self.stats
    }

    /// Timing of this poller.
    pub fn settings(&self) -> PollingSettings {
        self.settings
    }

    /// Runs one cycle: fetch, then dispatch the batch in order.
    pub async fn poll_once(&self) -> CycleOutcome {
        self.stats.cycles.fetch_add(1, Ordering::Relaxed);

        match self.source.fetch_updates().await {
            Ok(batch) => {
                let count = batch.len();
                if count > 0 {
                    debug!(count, "Dispatching batch");
                }
                self.dispatcher.dispatch_all(batch).await;
                self.stats.updates.fetch_add(count as u64, Ordering::Relaxed);
                CycleOutcome::Dispatched(count)
            }
            Err(e) if e.is_fatal() => CycleOutcome::Fatal(e),
            Err(e) => {
                self.stats.fetch_failures.fetch_add(1, Ordering::Relaxed);
                self.dispatcher.sink().report(&Failure::Transport(e));
                CycleOutcome::FetchFailed
            }
        }
    }

    /// Runs the loop with the configured interval.
    pub async fn start(&self, shutdown: &CancellationToken) -> RuntimeResult<()> {
        self.run(self.settings.interval, shutdown).await
    }

    /// Runs the loop, pausing `interval` after each cycle.
    ///
    /// After a cycle that unwound, the pause is the cooldown or `interval`,
    /// whichever is longer.
    ///
    /// Returns `Ok(())` once `shutdown` is cancelled. A cycle that is already
    /// dispatching is always allowed to finish.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::FatalTransport`] if the transport reports a
    /// misconfiguration.
    pub async fn run(&self, interval: Duration, shutdown: &CancellationToken) -> RuntimeResult<()> {
        info!(interval = ?interval, cooldown = ?self.settings.cooldown, "Polling started");

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let pause = match AssertUnwindSafe(self.poll_once()).catch_unwind().await {
                Ok(CycleOutcome::Fatal(e)) => {
                    error!(error = %e, "Transport is misconfigured, polling stopped");
                    return Err(RuntimeError::FatalTransport(e));
                }
                Ok(_) => interval,
                Err(payload) => {
                    self.stats.loop_recoveries.fetch_add(1, Ordering::Relaxed);
                    self.dispatcher.sink().report(&Failure::LoopFatal {
                        reason: panic_message(payload.as_ref()),
                    });
                    self.settings.cooldown.max(interval)
                }
            };

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        info!(cycles = self.stats.cycles(), "Polling stopped");
        Ok(())
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("settings", &self.settings)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
