//! Observability (structured logging)
//!
//! Generation is a short-lived command, so only logging is wired up: pretty
//! output while developing, JSON lines in release builds.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging stack
///
/// Sets up:
/// - Structured logging with JSON formatting (release) or pretty formatting (debug)
/// - `RUST_LOG` based filtering, falling back to the verbosity in `config`
///
/// Calling this twice is harmless; the second registration is ignored.
///
/// # Example
///
/// ```rust,no_run
/// use acton_forge::observability::{self, ObservabilityConfig};
///
/// observability::init(&ObservabilityConfig::default());
/// tracing::info!("Generator started");
/// ```
pub fn init(config: &ObservabilityConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_filter()));

    #[cfg(debug_assertions)]
    {
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init();
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init();
    }
}

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Crate target that receives the verbose level
    pub target: String,

    /// Emit debug-level events for the crate target
    pub verbose: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            target: "acton_forge".to_string(),
            verbose: cfg!(debug_assertions),
        }
    }
}

impl ObservabilityConfig {
    /// Create config for a crate target
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    /// Enable debug-level events for the target
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Filter directive used when `RUST_LOG` is not set
    #[must_use]
    pub fn default_filter(&self) -> String {
        let level = if self.verbose { "debug" } else { "info" };
        format!("warn,{}={level}", self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.target, "acton_forge");
    }

    #[test]
    fn test_builder() {
        let config = ObservabilityConfig::new("acton_forge_cli").with_verbose(true);

        assert_eq!(config.target, "acton_forge_cli");
        assert_eq!(config.default_filter(), "warn,acton_forge_cli=debug");
        assert_eq!(
            config.with_verbose(false).default_filter(),
            "warn,acton_forge_cli=info"
        );
    }
}
