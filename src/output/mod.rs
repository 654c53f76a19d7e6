//! Document output.
//!
//! The rendered document replaces the previous file atomically, so readers
//! and a stopping monitor never observe a half-written document.

mod writer;

pub use writer::write_document;
