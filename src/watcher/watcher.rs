//! Change monitor built on notify-rs.
//!
//! One monitor owns the debounce timer and runs rebuilds one at a time.
//! The backend thread filters notifications and puts relevant changes on a
//! bounded queue. Each change (re)arms the timer, and a rebuild starts once
//! the timer expires with no further events. Changes that land while a
//! rebuild is running stay queued, or raise the overflow flag when the
//! queue is full, and arm the timer again afterwards.

#![allow(clippy::module_name_repetitions)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use super::events::EventBatch;
use super::filter::VisibilityFilter;
use super::handler::{EventForwarder, EventGate, MonitorStats, MonitorStatsSnapshot};
use crate::error::WatcherError;
use crate::generator::Refresh;
use crate::{Error, Result};

/// Debounce duration for file events.
const DEBOUNCE_DURATION: Duration = Duration::from_millis(1000);

/// Capacity of the notification queue.
const QUEUE_CAPACITY: usize = 256;

/// A busy tree still gets rebuilt after this many debounce windows.
const MAX_DELAY_FACTOR: u32 = 10;

/// Stand-in for a deadline too far away to represent.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Change monitor configuration.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Root directory to watch recursively.
    pub root: PathBuf,
    /// Quiet period after the last relevant event.
    pub debounce: Duration,
    /// Capacity of the notification queue.
    pub queue_capacity: usize,
    /// Rebuild once as soon as the subscription is active.
    pub initial_rebuild: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            debounce: DEBOUNCE_DURATION,
            queue_capacity: QUEUE_CAPACITY,
            initial_rebuild: true,
        }
    }
}

/// Work performed when the debounce timer expires.
pub trait Rebuild: Send + 'static {
    /// Rebuild the tree, render it and persist the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the cycle fails. The monitor logs it and keeps
    /// running.
    fn rebuild(&mut self) -> Result<Refresh>;
}

/// Message from the notification backend.
#[derive(Debug)]
pub enum WatchMessage {
    /// Changes to visible paths were observed.
    Changed {
        /// Number of relevant paths in the batch.
        paths: usize,
    },
    /// The watched root no longer exists.
    RootRemoved,
    /// The backend failed; the subscription is no longer reliable.
    Failed(String),
}

/// Monitor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// No rebuild pending.
    Idle,
    /// Timer armed, waiting for the burst to settle.
    Debouncing,
    /// A rebuild is running.
    Rebuilding,
}

/// Debounce timer: re-armed by every event, capped so that a steady
/// stream of events cannot postpone a rebuild forever.
#[derive(Debug, Clone, Copy)]
pub struct Debounce {
    window: Duration,
    max_delay: Duration,
    first: Option<Instant>,
    deadline: Option<Instant>,
}

impl Debounce {
    /// Create an unarmed timer.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            max_delay: window.saturating_mul(MAX_DELAY_FACTOR),
            first: None,
            deadline: None,
        }
    }

    /// Arm or re-arm the timer for an event observed at `now`.
    ///
    /// Deadlines that overflow the clock saturate to a distant instant.
    pub fn arm(&mut self, now: Instant) {
        let first = *self.first.get_or_insert(now);
        let deadline = [
            now.checked_add(self.window),
            first.checked_add(self.max_delay),
        ]
        .into_iter()
        .flatten()
        .min()
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now);
        self.deadline = Some(deadline);
    }

    /// When the timer fires, if armed.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the timer is armed.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarm the timer.
    pub fn clear(&mut self) {
        self.first = None;
        self.deadline = None;
    }
}

/// Serializes debounced rebuilds for one root.
pub struct ChangeMonitor<R> {
    root: PathBuf,
    rebuilder: Arc<Mutex<R>>,
    debounce: Debounce,
    stats: Arc<MonitorStats>,
    overflowed: Arc<AtomicBool>,
    state: MonitorState,
    initial_rebuild: bool,
}

impl<R: Rebuild> ChangeMonitor<R> {
    /// Create a monitor.
    #[must_use]
    pub fn new(config: &WatcherConfig, rebuilder: R) -> Self {
        Self {
            root: config.root.clone(),
            rebuilder: Arc::new(Mutex::new(rebuilder)),
            debounce: Debounce::new(config.debounce),
            stats: MonitorStats::new(),
            overflowed: Arc::new(AtomicBool::new(false)),
            state: MonitorState::Idle,
            initial_rebuild: config.initial_rebuild,
        }
    }

    /// Shared stats for this monitor.
    #[must_use]
    pub fn stats(&self) -> Arc<MonitorStats> {
        Arc::clone(&self.stats)
    }

    /// Flag raised by the producer when a change could not be queued.
    #[must_use]
    pub fn overflow_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.overflowed)
    }

    /// Forwarder feeding this monitor through `tx`.
    #[must_use]
    pub fn forwarder(&self, gate: EventGate, tx: mpsc::Sender<WatchMessage>) -> EventForwarder {
        EventForwarder::new(gate, self.stats(), tx, self.overflow_flag())
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> MonitorState {
        self.state
    }

    /// Drain `events` until cancelled or the source closes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the root disappears.
    /// Rebuild failures never end the loop.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<WatchMessage>,
        cancel: CancellationToken,
    ) -> Result<MonitorStatsSnapshot> {
        if self.initial_rebuild {
            self.rebuild().await;
        }

        loop {
            if self.overflowed.swap(false, Ordering::AcqRel) {
                tracing::debug!("Changes were dropped from a full queue");
                self.arm();
            }
            let deadline = self.debounce.deadline();

            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    tracing::debug!(path = %self.root.display(), "Monitor cancelled");
                    break;
                }

                message = events.recv() => match message {
                    Some(WatchMessage::Changed { paths }) => {
                        tracing::trace!(paths, "Change received");
                        self.arm();
                    }
                    Some(WatchMessage::RootRemoved) => {
                        self.stats.errors.fetch_add(1, Ordering::Relaxed);
                        tracing::error!(path = %self.root.display(), "Watched root was removed");
                        return Err(WatcherError::RootRemoved {
                            path: self.root.display().to_string(),
                        }
                        .into());
                    }
                    Some(WatchMessage::Failed(reason)) => {
                        self.stats.errors.fetch_add(1, Ordering::Relaxed);
                        tracing::error!(%reason, "Watch backend failed");
                        return Err(WatcherError::Backend(reason).into());
                    }
                    None => {
                        tracing::debug!("Event source closed");
                        break;
                    }
                },

                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.debounce.clear();
                    self.rebuild().await;
                }
            }
        }

        Ok(self.stats.snapshot())
    }

    fn arm(&mut self) {
        if !self.debounce.is_armed() {
            tracing::trace!("Debounce armed");
        }
        self.debounce.arm(Instant::now());
        self.state = MonitorState::Debouncing;
    }

    async fn rebuild(&mut self) {
        self.state = MonitorState::Rebuilding;
        let started = Instant::now();
        let rebuilder = Arc::clone(&self.rebuilder);

        let result = match tokio::task::spawn_blocking(move || rebuilder.lock().rebuild()).await {
            Ok(result) => result,
            Err(e) => Err(Error::internal(format!("rebuild task failed: {e}"))),
        };

        self.stats.rebuilds.fetch_add(1, Ordering::Relaxed);
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(Refresh::Written(document)) => {
                self.stats.documents_written.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    entries = document.entry_lines().len(),
                    elapsed_ms,
                    "Document updated"
                );
            }
            Ok(Refresh::Unchanged) => {
                self.stats.unchanged.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(elapsed_ms, "Document unchanged");
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %e, "Rebuild failed, will retry on next change");
            }
        }

        self.state = MonitorState::Idle;
    }
}

/// Subscribe to recursive notifications under `root`, handing every
/// notification to `forwarder` on the backend thread.
///
/// # Errors
///
/// Returns an error if the backend cannot be created or `root` cannot be
/// watched.
pub fn subscribe(root: &Path, forwarder: EventForwarder) -> Result<RecommendedWatcher> {
    if !root.is_dir() {
        return Err(WatcherError::WatchFailed {
            path: root.display().to_string(),
            reason: "directory does not exist".to_string(),
        }
        .into());
    }

    let mut watcher = notify::recommended_watcher(
        move |result: std::result::Result<notify::Event, notify::Error>| match result {
            Ok(event) => forwarder.forward(&EventBatch::from_notify(&event)),
            Err(e) => {
                tracing::error!("Watch error: {:?}", e);
                forwarder.fail(e.to_string());
            }
        },
    )
    .map_err(|e| WatcherError::WatchFailed {
        path: root.display().to_string(),
        reason: e.to_string(),
    })?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| WatcherError::WatchFailed {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;

    tracing::info!(path = %root.display(), "Watching directory");
    Ok(watcher)
}

/// Handle to a running monitor. Cancelling it unsubscribes and stops the
/// loop after any in-flight rebuild has finished.
pub struct WatchHandle {
    cancel: CancellationToken,
    stats: Arc<MonitorStats>,
    task: JoinHandle<Result<MonitorStatsSnapshot>>,
}

impl WatchHandle {
    /// Current stats of the monitor.
    #[must_use]
    pub fn stats(&self) -> MonitorStatsSnapshot {
        self.stats.snapshot()
    }

    /// Token that stops the monitor when cancelled.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the monitor has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the monitor and wait for it to exit.
    ///
    /// # Errors
    ///
    /// Returns the fatal error that ended the monitor, if any.
    pub async fn stop(self) -> Result<MonitorStatsSnapshot> {
        self.cancel.cancel();
        self.join().await
    }

    /// Wait for the monitor to exit on its own.
    ///
    /// # Errors
    ///
    /// Returns the fatal error that ended the monitor, if any.
    pub async fn join(self) -> Result<MonitorStatsSnapshot> {
        self.task
            .await
            .map_err(|e| Error::internal(format!("monitor task failed: {e}")))?
    }
}

/// Subscribe to `config.root` and run a monitor on the current runtime.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Returns an error if the subscription cannot be established.
pub fn spawn_monitor<R: Rebuild>(
    config: &WatcherConfig,
    filter: VisibilityFilter,
    rebuilder: R,
) -> Result<WatchHandle> {
    let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
    let monitor = ChangeMonitor::new(config, rebuilder);
    let gate = EventGate::new(config.root.clone(), filter);
    let watcher = subscribe(&config.root, monitor.forwarder(gate, tx))?;

    let stats = monitor.stats();
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let root = config.root.clone();

    let task = tokio::spawn(async move {
        let result = monitor.run(rx, token).await;
        // Dropping the backend ends the subscription.
        drop(watcher);
        match &result {
            Ok(_) => tracing::info!(path = %root.display(), "Stopped watching directory"),
            Err(e) => tracing::error!(path = %root.display(), error = %e, "Monitor stopped"),
        }
        result
    });

    Ok(WatchHandle {
        cancel,
        stats,
        task,
    })
}
