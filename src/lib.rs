//! dirscribe library
//!
//! Keeps a filtered, human-readable rendering of a project directory tree
//! in a Markdown file, and rewrites it whenever the tree changes.
//!
//! ```no_run
//! use dirscribe::{Config, Generator, RootContext};
//!
//! # fn main() -> dirscribe::Result<()> {
//! let root = RootContext::detect(".")?;
//! let mut generator = Generator::new(&root, Config::default())?;
//! generator.refresh()?;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod generator;
pub mod observability;
pub mod output;
pub mod render;
pub mod watcher;

pub use config::{Config, IgnoreRules};
pub use error::{Error, Result};
pub use generator::{Generator, Refresh, RootContext, ROOT_MARKERS};
pub use render::Document;
pub use watcher::{MonitorStatsSnapshot, WatchHandle};
