//! Configuration settings and validation.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::{Error, Result};

/// Default name of the rendered document, relative to the root.
pub const DEFAULT_OUTPUT_FILE: &str = "directory-structure.md";

/// Default heading of the rendered document.
pub const DEFAULT_TITLE: &str = "Project Directory Structure";

/// Default quiet period before a rebuild, in milliseconds.
const DEFAULT_DEBOUNCE_MS: u64 = 1000;

/// Longest accepted quiet period, one hour.
pub const MAX_DEBOUNCE_MS: u64 = 3_600_000;

/// Four independent ignore-rule sets. A path is hidden if any set matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IgnoreRules {
    /// Bare names that are hidden wherever they appear.
    pub exact_names: BTreeSet<String>,
    /// File name suffixes, usually with a leading dot (`.pyc`).
    pub extensions: BTreeSet<String>,
    /// Glob patterns matched against the root-relative path.
    pub patterns: BTreeSet<String>,
    /// Substrings matched anywhere in the root-relative path.
    pub containing: BTreeSet<String>,
}

impl IgnoreRules {
    /// The rule sets written by the installer for a fresh project.
    #[must_use]
    pub fn recommended() -> Self {
        Self {
            exact_names: to_set(&[
                ".git",
                ".venv",
                "venv",
                "__pycache__",
                "node_modules",
                ".idea",
                ".vscode",
                "build",
                "dist",
                ".DS_Store",
                "Thumbs.db",
                ".pytest_cache",
                ".coverage",
                "htmlcov",
                ".env",
                ".env.local",
                ".env.*.local",
                "cache",
                ".cache",
                ".next",
            ]),
            extensions: to_set(&[
                ".pyc",
                ".pyo",
                ".pyd",
                ".so",
                ".dll",
                ".dylib",
                ".egg",
                ".egg-info",
                ".coverage",
                ".pytest_cache",
                ".DS_Store",
                ".env",
                ".log",
                ".pot",
                ".swp",
                ".swo",
                "~",
            ]),
            patterns: to_set(&[
                "*.egg-info/*",
                "*.egg/*",
                "*.pytest_cache/*",
                "*__pycache__*",
                "*.git/*",
                "*venv/*",
                "*.idea/*",
                "*.vscode/*",
                "*node_modules/*",
                "*build/*",
                "*dist/*",
                "*.env",
                "*.env.*",
                "*coverage/*",
                "*.coverage",
                "*htmlcov/*",
                "*cache/*",
                "*.cache/*",
                "*.next/*",
            ]),
            containing: to_set(&[
                ".git",
                "venv",
                "__pycache__",
                "node_modules",
                ".idea",
                ".vscode",
                "build",
                "dist",
                ".env",
                "coverage",
                "htmlcov",
                ".pytest_cache",
                "cache",
                ".cache",
                ".next",
            ]),
        }
    }

    /// Check whether no rules are configured at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exact_names.is_empty()
            && self.extensions.is_empty()
            && self.patterns.is_empty()
            && self.containing.is_empty()
    }
}

fn to_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Main configuration, immutable for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix each rendered entry with a category glyph.
    #[serde(deserialize_with = "deserialize_flag")]
    pub use_emojis: bool,

    /// Visibility rules.
    pub ignore_patterns: IgnoreRules,

    /// Output document path, relative to the project root.
    pub output_file: String,

    /// Heading written on the first line of the document.
    pub title: String,

    /// Quiet period after the last filesystem event before rebuilding.
    pub debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_emojis: true,
            ignore_patterns: IgnoreRules::recommended(),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            title: DEFAULT_TITLE.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or the result is invalid.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), "Configuration file loaded");
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.output_file.trim().is_empty() {
            return Err(Error::config("output_file cannot be empty"));
        }

        let output = Path::new(&self.output_file);
        if output.is_absolute() || output.has_root() {
            return Err(Error::config(format!(
                "output_file '{}' must be relative to the project root",
                self.output_file
            )));
        }

        if output
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(Error::config(format!(
                "output_file '{}' cannot leave the project root",
                self.output_file
            )));
        }

        if self.debounce_ms == 0 {
            return Err(Error::config("debounce_ms cannot be 0"));
        }

        if self.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(Error::config(format!(
                "debounce_ms cannot exceed {MAX_DEBOUNCE_MS}"
            )));
        }

        for pattern in &self.ignore_patterns.patterns {
            glob::Pattern::new(pattern).map_err(|e| {
                Error::config(format!("invalid ignore pattern '{pattern}': {e}"))
            })?;
        }

        Ok(())
    }

    /// Debounce window as a `Duration`.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Absolute path of the output document under `root`.
    #[must_use]
    pub fn output_path(&self, root: &Path) -> PathBuf {
        root.join(&self.output_file)
    }
}

/// Accept either a YAML bool or a string; strings count as true only when
/// they spell `true` in any case.
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s.trim().eq_ignore_ascii_case("true"),
    })
}
