//! Tree rendering into a line-based document.
//!
//! Rendering is a pure function of the tree and the configuration, so an
//! unchanged tree always yields a byte-identical document.

use std::fmt;

use super::classify::classify;
use crate::config::Config;
use crate::watcher::PathEntry;

/// Connector for a sibling that has more siblings after it.
pub const BRANCH: &str = "├── ";
/// Connector for the last sibling.
pub const LAST_BRANCH: &str = "└── ";
/// Continuation under an ancestor that has more siblings.
pub const VERTICAL: &str = "│   ";
/// Continuation under an ancestor that was the last sibling.
pub const BLANK: &str = "    ";

/// Rendered document: a heading, a blank line, then one line per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
}

impl Document {
    /// All lines, heading included.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Only the tree lines, without the heading block.
    #[must_use]
    pub fn entry_lines(&self) -> &[String] {
        self.lines.get(2..).unwrap_or_default()
    }

    /// Document text as written to disk.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    /// Content digest of the document text.
    #[must_use]
    pub fn digest(&self) -> blake3::Hash {
        blake3::hash(self.to_text().as_bytes())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Render the descendants of `root`; the root itself gets no line.
#[must_use]
pub fn render(root: &PathEntry, config: &Config) -> Document {
    let mut lines = Vec::with_capacity(root.descendant_count() + 2);
    lines.push(format!("# {}", config.title));
    lines.push(String::new());
    render_children(root, "", config.use_emojis, &mut lines);
    Document { lines }
}

fn render_children(entry: &PathEntry, prefix: &str, use_emojis: bool, lines: &mut Vec<String>) {
    let count = entry.children().len();

    for (i, child) in entry.children().iter().enumerate() {
        let is_last = i + 1 == count;
        let (branch, continuation) = if is_last {
            (LAST_BRANCH, BLANK)
        } else {
            (BRANCH, VERTICAL)
        };

        if use_emojis {
            let glyph = classify(child.name(), child.kind()).glyph();
            lines.push(format!("{prefix}{branch}{glyph} {}", child.name()));
        } else {
            lines.push(format!("{prefix}{branch}{}", child.name()));
        }

        if child.is_dir() {
            render_children(child, &format!("{prefix}{continuation}"), use_emojis, lines);
        }
    }
}
