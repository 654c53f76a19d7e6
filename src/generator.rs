//! Build, render and write pipeline.
//!
//! [`Generator`] ties the pieces together for one root: it walks the tree
//! through the visibility filter, renders the snapshot and writes the
//! document when its content changed. [`Generator::watch`] hands it to a
//! change monitor that reruns the pipeline after each burst of activity.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::output::write_document;
use crate::render::{render, Document};
use crate::watcher::{
    build_tree, spawn_monitor, Rebuild, VisibilityFilter, WatchHandle, WatcherConfig,
};
use crate::{Error, Result};

/// Files or directories that mark a project root.
pub const ROOT_MARKERS: &[&str] = &[".git", "package.json", "setup.py"];

/// Resolved root directory for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootContext {
    root: PathBuf,
}

impl RootContext {
    /// Use `root` as the project root.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` cannot be resolved or is not a directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(Error::config(format!(
                "root '{}' is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// Find the project root by walking up from `start` to the first
    /// directory holding one of [`ROOT_MARKERS`]. Falls back to `start`.
    ///
    /// # Errors
    ///
    /// Returns an error if `start` cannot be resolved.
    pub fn detect(start: impl AsRef<Path>) -> Result<Self> {
        let start = start.as_ref().canonicalize()?;

        let found = start
            .ancestors()
            .find(|dir| ROOT_MARKERS.iter().any(|m| dir.join(m).exists()));

        match found {
            Some(dir) => {
                tracing::debug!(root = %dir.display(), "Project root detected");
                Self::new(dir)
            }
            None => {
                tracing::debug!(root = %start.display(), "No project marker found, using start directory");
                Self::new(start)
            }
        }
    }

    /// Absolute root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Outcome of one refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// The document changed and was written.
    Written(Document),
    /// The rendered document matched the last one written.
    Unchanged,
}

type ChangeCallback = Box<dyn FnMut(&Document) + Send>;

/// Pipeline for one root and one configuration.
pub struct Generator {
    root: PathBuf,
    config: Config,
    filter: VisibilityFilter,
    output_path: PathBuf,
    last_digest: Option<blake3::Hash>,
    on_change: Option<ChangeCallback>,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("root", &self.root)
            .field("output_path", &self.output_path)
            .field("last_digest", &self.last_digest)
            .finish_non_exhaustive()
    }
}

impl Generator {
    /// Create a pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(context: &RootContext, config: Config) -> Result<Self> {
        config.validate()?;
        let filter = VisibilityFilter::from_config(&config)?;
        let root = context.root().to_path_buf();
        let output_path = config.output_path(&root);

        Ok(Self {
            root,
            config,
            filter,
            output_path,
            last_digest: None,
            on_change: None,
        })
    }

    /// Root being rendered.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the document is written.
    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Build and render the current tree without writing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be read.
    pub fn generate_once(&self) -> Result<Document> {
        let snapshot = build_tree(&self.root, &self.filter)?;
        Ok(render(&snapshot.root, &self.config))
    }

    /// Build, render and write the document if it changed since the last
    /// successful write.
    ///
    /// A failed write leaves the last digest untouched, so the next
    /// refresh tries again.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be read or the write fails.
    pub fn refresh(&mut self) -> Result<Refresh> {
        let document = self.generate_once()?;
        let digest = document.digest();

        if self.last_digest == Some(digest) {
            return Ok(Refresh::Unchanged);
        }

        write_document(&document, &self.output_path)?;
        self.last_digest = Some(digest);
        tracing::info!(path = %self.output_path.display(), "Updated {}", self.config.output_file);

        if let Some(callback) = self.on_change.as_mut() {
            callback(&document);
        }

        Ok(Refresh::Written(document))
    }

    /// Keep the document current until the returned handle is stopped.
    ///
    /// The first refresh runs as soon as the subscription is active;
    /// `on_change` is called after every write. Must be called from
    /// within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be watched.
    pub fn watch<F>(mut self, on_change: F) -> Result<WatchHandle>
    where
        F: FnMut(&Document) + Send + 'static,
    {
        self.on_change = Some(Box::new(on_change));
        let watcher_config = WatcherConfig {
            root: self.root.clone(),
            debounce: self.config.debounce(),
            ..Default::default()
        };
        let filter = self.filter.clone();
        spawn_monitor(&watcher_config, filter, self)
    }
}

impl Rebuild for Generator {
    fn rebuild(&mut self) -> Result<Refresh> {
        self.refresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn plain_config() -> Config {
        Config {
            use_emojis: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_root_context_new() {
        let tmp = TempDir::new().unwrap();
        let ctx = RootContext::new(tmp.path()).unwrap();
        assert!(ctx.root().is_absolute());
        assert!(RootContext::new(tmp.path().join("missing")).is_err());
    }

    #[test]
    fn test_detect_walks_up_to_marker() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("package.json"), "{}").unwrap();
        let nested = tmp.path().join("src").join("components");
        fs::create_dir_all(&nested).unwrap();

        let ctx = RootContext::detect(&nested).unwrap();
        assert_eq!(ctx.root(), tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_detect_prefers_nearest_marker() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join(".git")).unwrap();
        let inner = tmp.path().join("inner");
        fs::create_dir(&inner).unwrap();
        fs::write(inner.join("setup.py"), "").unwrap();

        let ctx = RootContext::detect(&inner).unwrap();
        assert_eq!(ctx.root(), inner.canonicalize().unwrap());
    }

    #[test]
    fn test_generate_once_does_not_write() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), "").unwrap();
        let ctx = RootContext::new(tmp.path()).unwrap();
        let generator = Generator::new(&ctx, plain_config()).unwrap();

        let doc = generator.generate_once().unwrap();
        assert_eq!(doc.entry_lines(), ["└── a.txt"]);
        assert!(!generator.output_path().exists());
    }

    #[test]
    fn test_refresh_writes_then_skips_unchanged() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), "").unwrap();
        let ctx = RootContext::new(tmp.path()).unwrap();
        let mut generator = Generator::new(&ctx, plain_config()).unwrap();

        assert!(matches!(generator.refresh().unwrap(), Refresh::Written(_)));
        // The written document itself is excluded, so nothing changed.
        assert_eq!(generator.refresh().unwrap(), Refresh::Unchanged);

        fs::write(tmp.path().join("b.txt"), "").unwrap();
        let Refresh::Written(doc) = generator.refresh().unwrap() else {
            panic!("expected a write after adding a file");
        };
        assert_eq!(doc.entry_lines(), ["├── a.txt", "└── b.txt"]);
        assert_eq!(
            fs::read_to_string(generator.output_path()).unwrap(),
            doc.to_text()
        );
    }

    #[test]
    fn test_refresh_retries_after_failed_write() {
        let tmp = TempDir::new().unwrap();
        let ctx = RootContext::new(tmp.path()).unwrap();
        let config = Config {
            output_file: "out/tree.md".to_string(),
            ..plain_config()
        };
        let mut generator = Generator::new(&ctx, config).unwrap();

        assert!(generator.refresh().is_err());

        fs::create_dir(tmp.path().join("out")).unwrap();
        // The new `out` directory shows up, and the write goes through.
        let Refresh::Written(doc) = generator.refresh().unwrap() else {
            panic!("expected a write once the directory exists");
        };
        assert_eq!(doc.entry_lines(), ["└── out"]);
        assert!(tmp.path().join("out").join("tree.md").exists());
    }

    #[test]
    fn test_refresh_calls_on_change() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let tmp = TempDir::new().unwrap();
        let ctx = RootContext::new(tmp.path()).unwrap();
        let mut generator = Generator::new(&ctx, plain_config()).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        generator.on_change = Some(Box::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        generator.refresh().unwrap();
        generator.refresh().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let tmp = TempDir::new().unwrap();
        let ctx = RootContext::new(tmp.path()).unwrap();
        let config = Config {
            output_file: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            Generator::new(&ctx, config),
            Err(Error::Config(_))
        ));
    }
}
