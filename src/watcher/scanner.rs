//! Directory scanner that builds the tree snapshot.
//!
//! Walks the root depth-first with symlinks followed, applies the
//! visibility filter to every entry, and assembles an ordered
//! [`PathEntry`] tree. Each build produces a fresh snapshot; nothing is
//! shared with the previous one.

use std::cmp::Ordering;
use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use super::filter::{relative_path, VisibilityFilter};
use crate::error::ScanError;
use crate::Result;

/// Hard bound on traversal depth. Deeper entries are skipped.
pub const MAX_DEPTH: usize = 128;

/// Kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A directory (or a symlink resolving to one).
    Directory,
    /// Anything else that resolves: regular files, links to files, devices.
    File,
}

/// Immutable snapshot of one filesystem node and its visible children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    name: String,
    segments: Vec<String>,
    kind: EntryKind,
    children: Vec<PathEntry>,
}

impl PathEntry {
    /// Create a file entry from a `/`-separated root-relative path.
    #[must_use]
    pub fn file(rel_path: &str) -> Self {
        Self::from_rel(rel_path, EntryKind::File, Vec::new())
    }

    /// Create a directory entry from a `/`-separated root-relative path.
    ///
    /// Children are kept in the order given.
    #[must_use]
    pub fn dir(rel_path: &str, children: Vec<Self>) -> Self {
        Self::from_rel(rel_path, EntryKind::Directory, children)
    }

    /// Create a root entry with the given display name.
    #[must_use]
    pub fn root(name: impl Into<String>, children: Vec<Self>) -> Self {
        Self {
            name: name.into(),
            segments: Vec::new(),
            kind: EntryKind::Directory,
            children,
        }
    }

    fn from_rel(rel_path: &str, kind: EntryKind, children: Vec<Self>) -> Self {
        let segments: Vec<String> = rel_path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Self {
            name: segments.last().cloned().unwrap_or_default(),
            segments,
            kind,
            children,
        }
    }

    /// Bare name of the entry.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path segments relative to the root. Empty for the root itself.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// `/`-joined path relative to the root.
    #[must_use]
    pub fn rel_path(&self) -> String {
        self.segments.join("/")
    }

    /// Kind of the entry.
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Whether the entry is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Visible children in canonical order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Number of entries below this one.
    #[must_use]
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }
}

/// Counters gathered during one build.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub directories: u64,
    pub files: u64,
    pub filtered: u64,
    pub errors: u64,
}

/// Result of one build.
#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    /// Root of the visible tree.
    pub root: PathEntry,
    /// Counters for this build.
    pub stats: ScanStats,
}

/// Canonical sibling order: case-insensitive by name, then byte order as
/// a tie-break so that `A` and `a` always land the same way.
#[must_use]
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Directories first, then files, each group in name order.
fn compare_dir_entries(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_dir = a.file_type().is_dir();
    let b_dir = b.file_type().is_dir();
    b_dir.cmp(&a_dir).then_with(|| {
        compare_names(
            &a.file_name().to_string_lossy(),
            &b.file_name().to_string_lossy(),
        )
    })
}

/// Build the visible tree under `root`.
///
/// Entries that cannot be read, vanish mid-walk, are dangling links or
/// close a symlink cycle are skipped. Only a failure on the root itself
/// is an error.
///
/// # Errors
///
/// Returns an error if `root` cannot be read or is not a directory.
pub fn build_tree(root: &Path, filter: &VisibilityFilter) -> Result<TreeSnapshot> {
    let meta = std::fs::metadata(root).map_err(|e| ScanError::RootUnreadable {
        path: root.display().to_string(),
        reason: e.to_string(),
    })?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory {
            path: root.display().to_string(),
        }
        .into());
    }

    let root_name = root
        .file_name()
        .map_or_else(|| ".".to_string(), |n| n.to_string_lossy().into_owned());

    let mut stats = ScanStats::default();
    // stack[d] is the open directory at depth d.
    let mut stack = vec![PathEntry::root(root_name, Vec::new())];

    let mut walker = WalkDir::new(root)
        .follow_links(true)
        .max_depth(MAX_DEPTH)
        .sort_by(compare_dir_entries)
        .into_iter();

    while let Some(next) = walker.next() {
        let entry = match next {
            Ok(entry) => entry,
            Err(e) => {
                if e.depth() == 0 {
                    return Err(ScanError::RootUnreadable {
                        path: root.display().to_string(),
                        reason: e.to_string(),
                    }
                    .into());
                }
                stats.errors += 1;
                tracing::debug!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        let depth = entry.depth();
        if depth == 0 {
            continue;
        }

        let Some(rel) = relative_path(root, entry.path()) else {
            continue;
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type().is_dir();

        if let Some(rule) = filter.matching_rule(&rel, &name, is_dir) {
            stats.filtered += 1;
            tracing::trace!(path = %rel, ?rule, "Entry filtered");
            if is_dir {
                walker.skip_current_dir();
            }
            continue;
        }

        close_until(&mut stack, depth);

        if is_dir {
            stats.directories += 1;
            stack.push(PathEntry::dir(&rel, Vec::new()));
        } else if let Some(parent) = stack.last_mut() {
            stats.files += 1;
            parent.children.push(PathEntry::file(&rel));
        }
    }

    close_until(&mut stack, 1);
    let tree = stack
        .pop()
        .ok_or_else(|| crate::Error::internal("tree stack emptied during build"))?;

    tracing::debug!(
        path = %root.display(),
        directories = stats.directories,
        files = stats.files,
        filtered = stats.filtered,
        errors = stats.errors,
        "Tree built"
    );

    Ok(TreeSnapshot { root: tree, stats })
}

/// Fold finished directories into their parents until the stack holds
/// exactly `depth` open directories.
fn close_until(stack: &mut Vec<PathEntry>, depth: usize) {
    while stack.len() > depth {
        let Some(done) = stack.pop() else { break };
        match stack.last_mut() {
            Some(parent) => parent.children.push(done),
            None => {
                stack.push(done);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IgnoreRules;
    use std::fs;
    use tempfile::TempDir;

    fn plain_filter() -> VisibilityFilter {
        VisibilityFilter::new(&IgnoreRules::default(), "directory-structure.md").unwrap()
    }

    fn names(entry: &PathEntry) -> Vec<&str> {
        entry.children().iter().map(PathEntry::name).collect()
    }

    #[test]
    fn test_compare_names() {
        assert_eq!(compare_names("a.py", "B.py"), Ordering::Less);
        assert_eq!(compare_names("README.md", "readme.md"), Ordering::Less);
        assert_eq!(compare_names("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_path_entry_constructors() {
        let tree = PathEntry::root(
            "project",
            vec![PathEntry::dir("src", vec![PathEntry::file("src/main.rs")])],
        );
        assert_eq!(tree.descendant_count(), 2);
        let src = &tree.children()[0];
        assert!(src.is_dir());
        assert_eq!(src.children()[0].name(), "main.rs");
        assert_eq!(src.children()[0].rel_path(), "src/main.rs");
        assert_eq!(src.children()[0].segments(), ["src", "main.rs"]);
    }

    #[test]
    fn test_build_orders_dirs_first_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.txt"), "").unwrap();
        fs::write(tmp.path().join("A.txt"), "").unwrap();
        fs::write(tmp.path().join("c.txt"), "").unwrap();
        fs::create_dir(tmp.path().join("zeta")).unwrap();
        fs::create_dir(tmp.path().join("Alpha")).unwrap();

        let snapshot = build_tree(tmp.path(), &plain_filter()).unwrap();
        assert_eq!(
            names(&snapshot.root),
            ["Alpha", "zeta", "A.txt", "b.txt", "c.txt"]
        );
        assert_eq!(snapshot.stats.directories, 2);
        assert_eq!(snapshot.stats.files, 3);
    }

    #[test]
    fn test_build_nested_and_filtered() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("util")).unwrap();
        fs::write(src.join("util").join("io.py"), "").unwrap();
        fs::write(src.join("main.py"), "").unwrap();
        fs::create_dir_all(tmp.path().join("venv").join("lib")).unwrap();
        fs::write(tmp.path().join("venv").join("lib").join("site.py"), "").unwrap();
        fs::write(tmp.path().join("directory-structure.md"), "old").unwrap();

        let mut rules = IgnoreRules::default();
        rules.exact_names.insert("venv".to_string());
        let filter = VisibilityFilter::new(&rules, "directory-structure.md").unwrap();

        let snapshot = build_tree(tmp.path(), &filter).unwrap();
        assert_eq!(names(&snapshot.root), ["src"]);
        let src = &snapshot.root.children()[0];
        assert_eq!(names(src), ["util", "main.py"]);
        assert_eq!(src.children()[0].children()[0].rel_path(), "src/util/io.py");
        // venv and the output document; venv's contents are never visited.
        assert_eq!(snapshot.stats.filtered, 2);
    }

    #[test]
    fn test_build_empty_directory_kept() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("empty")).unwrap();

        let snapshot = build_tree(tmp.path(), &plain_filter()).unwrap();
        let empty = &snapshot.root.children()[0];
        assert!(empty.is_dir());
        assert!(empty.children().is_empty());
    }

    #[test]
    fn test_build_missing_root() {
        let tmp = TempDir::new().unwrap();
        let err = build_tree(&tmp.path().join("gone"), &plain_filter()).unwrap_err();
        assert!(matches!(err, crate::Error::Scan(ScanError::RootUnreadable { .. })));
    }

    #[test]
    fn test_build_root_is_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file.txt");
        fs::write(&file, "").unwrap();
        let err = build_tree(&file, &plain_filter()).unwrap_err();
        assert!(matches!(err, crate::Error::Scan(ScanError::NotADirectory { .. })));
    }

    #[test]
    fn test_build_is_deterministic() {
        let tmp = TempDir::new().unwrap();
        for name in ["x.rs", "Y.rs", "z.rs"] {
            fs::write(tmp.path().join(name), "").unwrap();
        }
        fs::create_dir(tmp.path().join("d")).unwrap();

        let first = build_tree(tmp.path(), &plain_filter()).unwrap();
        let second = build_tree(tmp.path(), &plain_filter()).unwrap();
        assert_eq!(first.root, second.root);
    }

    #[cfg(unix)]
    #[test]
    fn test_build_survives_symlink_cycle() {
        let tmp = TempDir::new().unwrap();
        let inner = tmp.path().join("a").join("b");
        fs::create_dir_all(&inner).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("a"), inner.join("back")).unwrap();

        let snapshot = build_tree(tmp.path(), &plain_filter()).unwrap();
        let a = &snapshot.root.children()[0];
        let b = &a.children()[0];
        assert_eq!(b.name(), "b");
        assert!(b.children().is_empty());
        assert!(snapshot.stats.errors >= 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_build_symlinks_take_target_kind() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("real")).unwrap();
        fs::write(tmp.path().join("real").join("f.txt"), "").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("real"), tmp.path().join("alias")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("nowhere"), tmp.path().join("dangling"))
            .unwrap();

        let snapshot = build_tree(tmp.path(), &plain_filter()).unwrap();
        assert_eq!(names(&snapshot.root), ["alias", "real"]);
        assert!(snapshot.root.children()[0].is_dir());
        assert_eq!(names(&snapshot.root.children()[0]), ["f.txt"]);
    }
}
