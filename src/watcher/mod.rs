//! File system scanning and watching.
//!
//! This module provides:
//! - Visibility filtering with exact-name, extension, glob and substring rules
//! - Tree snapshots built by a filtered, cycle-safe directory walk
//! - Directory watching using notify-rs with debounced, serialized rebuilds

pub(crate) mod filter;
mod events;
mod handler;
mod scanner;
#[allow(clippy::module_inception)]
mod watcher;

pub use events::{EventBatch, FileEvent};
pub use filter::{relative_path, Rule, VisibilityFilter};
pub use handler::{BatchVerdict, EventForwarder, EventGate, MonitorStats, MonitorStatsSnapshot};
pub use scanner::{
    build_tree, compare_names, EntryKind, PathEntry, ScanStats, TreeSnapshot, MAX_DEPTH,
};
pub use watcher::{
    spawn_monitor, subscribe, ChangeMonitor, Debounce, MonitorState, Rebuild, WatchHandle,
    WatchMessage, WatcherConfig,
};
