//! Document rendering.
//!
//! This module provides:
//! - File type classification for optional glyph decoration
//! - Box-drawing tree rendering of a filtered tree snapshot

mod classify;
mod tree;

pub use classify::{classify, Category, DocumentKind, Language};
pub use tree::{render, Document, BLANK, BRANCH, LAST_BRANCH, VERTICAL};
