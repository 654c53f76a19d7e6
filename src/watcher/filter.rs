//! Visibility filtering for tree entries.
//!
//! Four independent rule sets are unioned: a path is hidden as soon as
//! any of them matches. The output document and the writer's temporary
//! files are always hidden, whatever the configuration says.

use std::collections::BTreeSet;
use std::path::{Component, Path};

use glob::{MatchOptions, Pattern};

use crate::config::{Config, IgnoreRules};
use crate::{Error, Result};

/// Suffix of the writer's temporary files.
pub(crate) const TEMP_SUFFIX: &str = ".tmp";

/// Glob options mirroring shell `fnmatch`: `*` may cross `/`.
const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// The rule that hid a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// The output document or one of its temporary files.
    Output,
    /// An exact-name rule.
    ExactName,
    /// An extension rule (files only).
    Extension,
    /// A glob pattern rule.
    Pattern,
    /// A substring rule.
    Containing,
}

/// Decides which paths appear in the rendered tree.
#[derive(Debug, Clone)]
pub struct VisibilityFilter {
    exact_names: BTreeSet<String>,
    extensions: Vec<String>,
    patterns: Vec<Pattern>,
    containing: Vec<String>,
    output_rel: String,
    output_dir_rel: String,
    temp_prefix: String,
}

impl VisibilityFilter {
    /// Create a filter from rule sets and the root-relative output path.
    ///
    /// # Errors
    ///
    /// Returns an error if a glob pattern is malformed.
    pub fn new(rules: &IgnoreRules, output_file: &str) -> Result<Self> {
        let patterns = rules
            .patterns
            .iter()
            .map(|p| {
                Pattern::new(p)
                    .map_err(|e| Error::config(format!("invalid ignore pattern '{p}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let output_rel = normalize(Path::new(output_file));
        let (output_dir_rel, output_name) = match output_rel.rsplit_once('/') {
            Some((dir, name)) => (dir.to_string(), name.to_string()),
            None => (String::new(), output_rel.clone()),
        };

        Ok(Self {
            exact_names: rules.exact_names.clone(),
            extensions: rules
                .extensions
                .iter()
                .filter(|e| !e.is_empty())
                .cloned()
                .collect(),
            patterns,
            containing: rules
                .containing
                .iter()
                .filter(|c| !c.is_empty())
                .cloned()
                .collect(),
            output_rel,
            output_dir_rel,
            temp_prefix: temp_prefix(&output_name),
        })
    }

    /// Create a filter from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a glob pattern is malformed.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.ignore_patterns, &config.output_file)
    }

    /// Check whether an entry is hidden.
    ///
    /// `rel_path` is the `/`-separated path relative to the root, `name`
    /// the bare file name.
    #[must_use]
    pub fn is_ignored(&self, rel_path: &str, name: &str, is_dir: bool) -> bool {
        self.matching_rule(rel_path, name, is_dir).is_some()
    }

    /// Return the first rule that hides an entry, if any.
    #[must_use]
    pub fn matching_rule(&self, rel_path: &str, name: &str, is_dir: bool) -> Option<Rule> {
        if self.is_output_artifact(rel_path, name) {
            return Some(Rule::Output);
        }

        if self.exact_names.contains(name) {
            return Some(Rule::ExactName);
        }

        if !is_dir && self.extensions.iter().any(|ext| matches_extension(name, ext)) {
            return Some(Rule::Extension);
        }

        if self
            .patterns
            .iter()
            .any(|p| p.matches_with(rel_path, GLOB_OPTIONS))
        {
            return Some(Rule::Pattern);
        }

        if self.containing.iter().any(|s| rel_path.contains(s.as_str())) {
            return Some(Rule::Containing);
        }

        None
    }

    /// Check whether a path or any of its ancestors is hidden.
    ///
    /// Used for notification paths, where an event deep inside an ignored
    /// directory must be dropped too. When the kind of the leaf is unknown
    /// (it no longer exists), it only counts as hidden if it would be
    /// hidden as either a file or a directory.
    #[must_use]
    pub fn is_path_ignored(&self, rel_path: &str, is_dir: Option<bool>) -> bool {
        let segments: Vec<&str> = rel_path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((leaf, ancestors)) = segments.split_last() else {
            return false;
        };

        let mut prefix = String::new();
        for segment in ancestors {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            if self.is_ignored(&prefix, segment, true) {
                return true;
            }
        }

        match is_dir {
            Some(is_dir) => self.is_ignored(rel_path, leaf, is_dir),
            None => self.is_ignored(rel_path, leaf, true) && self.is_ignored(rel_path, leaf, false),
        }
    }

    /// Check whether a path is the output document or a writer temp file.
    #[must_use]
    pub fn is_output_artifact(&self, rel_path: &str, name: &str) -> bool {
        if rel_path == self.output_rel {
            return true;
        }

        let parent = rel_path.rsplit_once('/').map_or("", |(dir, _)| dir);
        parent == self.output_dir_rel
            && name.starts_with(&self.temp_prefix)
            && name.ends_with(TEMP_SUFFIX)
    }
}

/// Prefix of the writer's temporary files for an output named `name`.
pub(crate) fn temp_prefix(name: &str) -> String {
    format!(".{name}.")
}

/// Extension rules starting with a dot, or made of symbols (`~`), are
/// plain suffix matches. Bare alphanumeric rules (`pyc`) compare against
/// the text after the last dot.
fn matches_extension(name: &str, ext: &str) -> bool {
    if ext.starts_with('.') || !ext.chars().all(char::is_alphanumeric) {
        name.ends_with(ext)
    } else {
        name.rsplit_once('.').is_some_and(|(_, suffix)| suffix == ext)
    }
}

/// Join the normal components of `path` with `/`.
fn normalize(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Express `path` relative to `root` with `/` separators.
///
/// Returns `None` when `path` is not under `root`.
#[must_use]
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(normalize)
}
