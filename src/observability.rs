//! Structured logging configuration.
//!
//! Sets up the `tracing` subscriber with:
//! - Plain text or JSON output
//! - Level from `RUST_LOG`, falling back to the configured level
//! - Target, thread and source location on every record

use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Environment variable holding the default log level.
pub const LOG_LEVEL_ENV: &str = "DIRSCRIBE_LOG_LEVEL";

/// Environment variable enabling JSON output.
pub const LOG_JSON_ENV: &str = "DIRSCRIBE_LOG_JSON";

/// Tracing configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable JSON output format
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl TracingConfig {
    /// Apply command-line values on top of this configuration.
    ///
    /// An explicit level replaces the current one; `json` can only turn
    /// JSON output on.
    #[must_use]
    pub fn with_overrides(mut self, level: Option<String>, json: bool) -> Self {
        if let Some(level) = level {
            self.level = level;
        }
        self.json |= json;
        self
    }

    /// Install the global subscriber for this configuration.
    ///
    /// # Panics
    ///
    /// Panics if a global subscriber has already been installed.
    pub fn init(&self) {
        init_tracing(&self.level, self.json);
    }
}

/// Initialize tracing for the process.
///
/// `RUST_LOG` takes precedence over `level` when set.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed.
pub fn init_tracing(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);

        Registry::default().with(env_filter).with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);

        Registry::default().with(env_filter).with(fmt_layer).init();
    }

    tracing::debug!("Tracing initialized: level={}, json={}", level, json);
}

/// Read tracing configuration from [`LOG_LEVEL_ENV`] and [`LOG_JSON_ENV`].
#[must_use]
pub fn config_from_env() -> TracingConfig {
    config_from_vars(
        std::env::var(LOG_LEVEL_ENV).ok(),
        std::env::var(LOG_JSON_ENV).ok(),
    )
}

fn config_from_vars(level: Option<String>, json: Option<String>) -> TracingConfig {
    let level = level
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| "info".to_string());
    let json = json.is_some_and(|v| is_truthy(&v));

    TracingConfig { level, json }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_config_default() {
        let config = TracingConfig::default();
        assert_eq!(config.level, "info");
        assert!(!config.json);
    }

    #[test]
    fn test_config_from_vars() {
        assert_eq!(config_from_vars(None, None), TracingConfig::default());

        let config = config_from_vars(Some("debug".to_string()), Some("TRUE".to_string()));
        assert_eq!(config.level, "debug");
        assert!(config.json);

        let config = config_from_vars(Some("  ".to_string()), Some("0".to_string()));
        assert_eq!(config.level, "info");
        assert!(!config.json);
    }

    #[test]
    fn test_with_overrides() {
        let base = config_from_vars(Some("warn".to_string()), Some("1".to_string()));

        let kept = base.clone().with_overrides(None, false);
        assert_eq!(kept, base);

        let overridden = TracingConfig::default().with_overrides(Some("trace".to_string()), true);
        assert_eq!(overridden.level, "trace");
        assert!(overridden.json);
    }

    #[test]
    fn test_is_truthy() {
        for value in ["true", "1", "yes", "On"] {
            assert!(is_truthy(value), "{value}");
        }
        for value in ["false", "0", "no", ""] {
            assert!(!is_truthy(value), "{value}");
        }
    }
}
