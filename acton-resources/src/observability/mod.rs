//! Observability (structured logging)
//!
//! Tree resolution, generation and dispatch emit `tracing` events. This
//! module installs a subscriber for applications and tools that do not bring
//! their own. Logs go to stderr so route listings on stdout stay clean.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line human-readable output
    Pretty,
    /// Single-line human-readable output
    Compact,
    /// One JSON object per event
    Json,
    /// Pretty in debug builds, JSON in release builds
    #[default]
    Auto,
}

/// Observability configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,

    /// Output format
    pub format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let default_filter = if cfg!(debug_assertions) {
            "info,acton_resources=debug"
        } else {
            "info"
        };
        Self {
            default_filter: default_filter.to_string(),
            format: LogFormat::Auto,
        }
    }
}

impl ObservabilityConfig {
    /// Use `filter` when `RUST_LOG` is unset
    #[must_use]
    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    /// Use a specific output format
    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    fn resolved_format(&self) -> LogFormat {
        match self.format {
            LogFormat::Auto if cfg!(debug_assertions) => LogFormat::Pretty,
            LogFormat::Auto => LogFormat::Json,
            other => other,
        }
    }
}

/// Initialize logging with the default configuration
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
///
/// # Example
///
/// ```rust,no_run
/// use acton_resources::observability;
///
/// # fn main() -> anyhow::Result<()> {
/// observability::init()?;
/// tracing::info!("Application started");
/// # Ok(())
/// # }
/// ```
pub fn init() -> anyhow::Result<()> {
    init_with(&ObservabilityConfig::default())
}

/// Initialize logging
///
/// `RUST_LOG` takes precedence over the configured default filter.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_with(config: &ObservabilityConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match config.resolved_format() {
        LogFormat::Json => registry.with(layer.json()).try_init()?,
        LogFormat::Compact => registry.with(layer.compact()).try_init()?,
        LogFormat::Pretty | LogFormat::Auto => registry.with(layer.pretty()).try_init()?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert!(config.default_filter.starts_with("info"));
        assert_eq!(config.format, LogFormat::Auto);
    }

    #[test]
    fn test_builder() {
        let config = ObservabilityConfig::default()
            .with_default_filter("warn")
            .with_format(LogFormat::Json);

        assert_eq!(config.default_filter, "warn");
        assert_eq!(config.resolved_format(), LogFormat::Json);
    }

    #[test]
    fn test_auto_format_resolves() {
        let resolved = ObservabilityConfig::default().resolved_format();
        assert_ne!(resolved, LogFormat::Auto);
    }

    #[test]
    fn test_second_init_fails() {
        let config = ObservabilityConfig::default().with_format(LogFormat::Compact);
        let first = init_with(&config);
        let second = init_with(&config);
        // Another test may have installed the subscriber first
        assert!(first.is_err() || second.is_err());
    }
}
