//! File type classification for entry decoration.
//!
//! Classification never affects visibility. Unknown extensions map to
//! [`Category::Default`].

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::watcher::EntryKind;

/// Programming languages with their own glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    React,
    Php,
    Java,
    CFamily,
    Go,
    Ruby,
    Rust,
    Swift,
    Kotlin,
}

/// Documents with their own glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Markdown,
    PlainText,
    Pdf,
    WordProcessor,
}

/// Display category of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Directory,
    SourceCode(Language),
    Markup,
    Stylesheet,
    Document(DocumentKind),
    StructuredData,
    TabularData,
    Image,
    Default,
}

impl Category {
    /// Glyph prefixed to the entry name when decoration is enabled.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Directory => "📁",
            Self::SourceCode(lang) => match lang {
                Language::Python => "🐍",
                Language::JavaScript => "📜",
                Language::TypeScript => "📘",
                Language::React => "⚛️",
                Language::Php => "🐘",
                Language::Java => "☕",
                Language::CFamily => "⚙️",
                Language::Go => "🐹",
                Language::Ruby => "💎",
                Language::Rust => "🦀",
                Language::Swift => "🍎",
                Language::Kotlin => "📱",
            },
            Self::Markup => "🌐",
            Self::Stylesheet => "🎨",
            Self::Document(kind) => match kind {
                DocumentKind::Markdown => "📝",
                DocumentKind::Pdf => "📕",
                DocumentKind::WordProcessor => "📘",
                DocumentKind::PlainText => "📄",
            },
            Self::StructuredData => "📋",
            Self::TabularData => "📊",
            Self::Image => "🖼️",
            Self::Default => "📄",
        }
    }
}

static BY_EXTENSION: Lazy<HashMap<&'static str, Category>> = Lazy::new(|| {
    use Category::{Document, Image, Markup, SourceCode, StructuredData, Stylesheet, TabularData};

    HashMap::from([
        (".py", SourceCode(Language::Python)),
        (".js", SourceCode(Language::JavaScript)),
        (".ts", SourceCode(Language::TypeScript)),
        (".jsx", SourceCode(Language::React)),
        (".tsx", SourceCode(Language::React)),
        (".php", SourceCode(Language::Php)),
        (".java", SourceCode(Language::Java)),
        (".c", SourceCode(Language::CFamily)),
        (".cpp", SourceCode(Language::CFamily)),
        (".go", SourceCode(Language::Go)),
        (".rb", SourceCode(Language::Ruby)),
        (".rs", SourceCode(Language::Rust)),
        (".swift", SourceCode(Language::Swift)),
        (".kt", SourceCode(Language::Kotlin)),
        (".html", Markup),
        (".css", Stylesheet),
        (".scss", Stylesheet),
        (".sass", Stylesheet),
        (".less", Stylesheet),
        (".json", StructuredData),
        (".yaml", StructuredData),
        (".yml", StructuredData),
        (".xml", StructuredData),
        (".csv", TabularData),
        (".xls", TabularData),
        (".xlsx", TabularData),
        (".md", Document(DocumentKind::Markdown)),
        (".txt", Document(DocumentKind::PlainText)),
        (".pdf", Document(DocumentKind::Pdf)),
        (".doc", Document(DocumentKind::WordProcessor)),
        (".docx", Document(DocumentKind::WordProcessor)),
        (".jpg", Image),
        (".jpeg", Image),
        (".png", Image),
        (".gif", Image),
        (".svg", Image),
    ])
});

/// Classify an entry by kind, exact name, then lowercased extension.
#[must_use]
pub fn classify(name: &str, kind: EntryKind) -> Category {
    if kind == EntryKind::Directory {
        return Category::Directory;
    }

    if let Some(category) = BY_EXTENSION.get(name) {
        return *category;
    }

    extension(name)
        .and_then(|ext| BY_EXTENSION.get(ext.to_lowercase().as_str()).copied())
        .unwrap_or(Category::Default)
}

/// Extension including the dot. A leading dot alone (`.bashrc`) is not
/// an extension.
fn extension(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(&name[idx..]),
        _ => None,
    }
}
