//! File system event types and handling.

#![allow(clippy::missing_const_for_fn)]

use std::path::PathBuf;

use notify::event::{ModifyKind, RenameMode};
use notify::EventKind;

/// File system event types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    /// Entry was created.
    Created(PathBuf),
    /// Entry content or metadata changed.
    Modified(PathBuf),
    /// Entry was deleted.
    Deleted(PathBuf),
    /// Entry was renamed from old path to new path.
    Renamed { from: PathBuf, to: PathBuf },
}

impl FileEvent {
    /// Get the primary path associated with this event.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Created(p) | Self::Modified(p) | Self::Deleted(p) => p,
            Self::Renamed { to, .. } => to,
        }
    }

    /// Translate a backend notification into events.
    ///
    /// Access notifications carry no change and produce nothing.
    #[must_use]
    pub fn from_notify(event: &notify::Event) -> Vec<Self> {
        let paths = event.paths.iter().cloned();
        match event.kind {
            EventKind::Access(_) => Vec::new(),
            EventKind::Create(_) => paths.map(Self::Created).collect(),
            EventKind::Remove(_) => paths.map(Self::Deleted).collect(),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() >= 2 => {
                vec![Self::Renamed {
                    from: event.paths[0].clone(),
                    to: event.paths[1].clone(),
                }]
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                paths.map(Self::Deleted).collect()
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                paths.map(Self::Created).collect()
            }
            EventKind::Modify(_) | EventKind::Any | EventKind::Other => {
                paths.map(Self::Modified).collect()
            }
        }
    }
}

/// Batch of file events for processing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventBatch {
    /// Created or modified paths.
    pub modified: Vec<PathBuf>,
    /// Deleted paths.
    pub deleted: Vec<PathBuf>,
}

impl EventBatch {
    /// Create a new empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a batch from one backend notification.
    #[must_use]
    pub fn from_notify(event: &notify::Event) -> Self {
        let mut batch = Self::new();
        for file_event in FileEvent::from_notify(event) {
            batch.add(file_event);
        }
        batch
    }

    /// Add an event to the batch.
    pub fn add(&mut self, event: FileEvent) {
        match event {
            FileEvent::Created(path) | FileEvent::Modified(path) => {
                self.deleted.retain(|p| p != &path);
                if !self.modified.contains(&path) {
                    self.modified.push(path);
                }
            }
            FileEvent::Deleted(path) => {
                // Remove from modified if present
                self.modified.retain(|p| p != &path);
                if !self.deleted.contains(&path) {
                    self.deleted.push(path);
                }
            }
            FileEvent::Renamed { from, to } => {
                // Treat as delete + create
                self.add(FileEvent::Deleted(from));
                self.add(FileEvent::Created(to));
            }
        }
    }

    /// All paths touched by the batch.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.modified.iter().chain(self.deleted.iter())
    }

    /// Check if batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.deleted.is_empty()
    }

    /// Get total number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modified.len() + self.deleted.len()
    }

    /// Clear all events.
    pub fn clear(&mut self) {
        self.modified.clear();
        self.deleted.clear();
    }
}
