//! Configuration management for dirscribe.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - Environment variables
//! - A YAML configuration file (lowest priority)
//!
//! The configuration is fixed once the core starts.

mod settings;

pub use settings::{Config, IgnoreRules, DEFAULT_OUTPUT_FILE, DEFAULT_TITLE, MAX_DEBOUNCE_MS};
