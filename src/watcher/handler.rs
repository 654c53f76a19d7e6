//! Notification relevance checks and monitor statistics.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};

use super::events::EventBatch;
use super::filter::{relative_path, VisibilityFilter};
use super::watcher::WatchMessage;

/// Statistics for a watch session.
#[derive(Debug, Default)]
pub struct MonitorStats {
    pub events_received: AtomicU64,
    pub events_filtered: AtomicU64,
    pub rebuilds: AtomicU64,
    pub documents_written: AtomicU64,
    pub unchanged: AtomicU64,
    pub overflows: AtomicU64,
    pub errors: AtomicU64,
}

impl MonitorStats {
    /// Create new stats tracker.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get snapshot of current stats.
    #[must_use]
    pub fn snapshot(&self) -> MonitorStatsSnapshot {
        MonitorStatsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_filtered: self.events_filtered.load(Ordering::Relaxed),
            rebuilds: self.rebuilds.load(Ordering::Relaxed),
            documents_written: self.documents_written.load(Ordering::Relaxed),
            unchanged: self.unchanged.load(Ordering::Relaxed),
            overflows: self.overflows.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of monitor stats.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MonitorStatsSnapshot {
    pub events_received: u64,
    pub events_filtered: u64,
    pub rebuilds: u64,
    pub documents_written: u64,
    pub unchanged: u64,
    pub overflows: u64,
    pub errors: u64,
}

/// Outcome of inspecting one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchVerdict {
    /// Paths that may change the visible tree.
    pub relevant: usize,
    /// Paths hidden by the visibility rules or outside the root.
    pub filtered: usize,
    /// The root itself no longer exists.
    pub root_removed: bool,
}

impl BatchVerdict {
    /// Whether the batch should arm the debounce timer.
    #[must_use]
    pub const fn should_rebuild(&self) -> bool {
        self.relevant > 0
    }
}

/// Drops notifications that cannot change the rendered tree.
///
/// This is only an optimization: every rebuild applies the visibility
/// rules again from scratch.
#[derive(Debug, Clone)]
pub struct EventGate {
    root: PathBuf,
    filter: VisibilityFilter,
}

impl EventGate {
    /// Create a gate for `root`.
    #[must_use]
    pub fn new(root: PathBuf, filter: VisibilityFilter) -> Self {
        Self { root, filter }
    }

    /// Check whether a change at `path` can affect the rendered tree.
    #[must_use]
    pub fn is_relevant(&self, path: &Path) -> bool {
        let Some(rel) = relative_path(&self.root, path) else {
            return false;
        };
        if rel.is_empty() {
            return true;
        }

        let is_dir = std::fs::metadata(path).ok().map(|m| m.is_dir());
        !self.filter.is_path_ignored(&rel, is_dir)
    }

    /// Classify every path in a batch.
    #[must_use]
    pub fn inspect(&self, batch: &EventBatch) -> BatchVerdict {
        let mut verdict = BatchVerdict::default();

        for path in batch.paths() {
            if self.is_relevant(path) {
                verdict.relevant += 1;
            } else {
                verdict.filtered += 1;
                tracing::trace!(path = %path.display(), "Ignoring event for hidden path");
            }
        }

        if !batch.is_empty() && !self.root.exists() {
            verdict.root_removed = true;
        }

        verdict
    }
}

/// Feeds backend notifications into the monitor queue.
///
/// Runs on the backend's thread, so the filesystem lookups of the gate
/// never block the runtime. Hidden paths are counted and dropped here and
/// never take a queue slot. When the queue is full, the overflow flag is
/// raised instead; the monitor treats it as a relevant change.
#[derive(Debug)]
pub struct EventForwarder {
    gate: EventGate,
    stats: Arc<MonitorStats>,
    tx: mpsc::Sender<WatchMessage>,
    overflowed: Arc<AtomicBool>,
}

impl EventForwarder {
    /// Create a forwarder sharing `stats` and `overflowed` with a monitor.
    #[must_use]
    pub fn new(
        gate: EventGate,
        stats: Arc<MonitorStats>,
        tx: mpsc::Sender<WatchMessage>,
        overflowed: Arc<AtomicBool>,
    ) -> Self {
        Self {
            gate,
            stats,
            tx,
            overflowed,
        }
    }

    /// Inspect a batch and queue what the monitor needs to see.
    ///
    /// Root removal goes through a blocking send and must not be called
    /// from an async context.
    pub fn forward(&self, batch: &EventBatch) {
        if batch.is_empty() {
            return;
        }

        let verdict = self.gate.inspect(batch);
        self.stats
            .events_received
            .fetch_add(batch.len() as u64, Ordering::Relaxed);
        self.stats
            .events_filtered
            .fetch_add(verdict.filtered as u64, Ordering::Relaxed);

        if verdict.root_removed {
            let _ = self.tx.blocking_send(WatchMessage::RootRemoved);
            return;
        }

        if !verdict.should_rebuild() {
            return;
        }

        let message = WatchMessage::Changed {
            paths: verdict.relevant,
        };
        if let Err(TrySendError::Full(_)) = self.tx.try_send(message) {
            self.stats.overflows.fetch_add(1, Ordering::Relaxed);
            self.overflowed.store(true, Ordering::Release);
            tracing::trace!("Event queue full, flagging overflow");
        }
    }

    /// Report a backend failure. Always delivered.
    pub fn fail(&self, reason: String) {
        let _ = self.tx.blocking_send(WatchMessage::Failed(reason));
    }
}
