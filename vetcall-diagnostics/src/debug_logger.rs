//! Structured logging setup

use tracing_subscriber::{fmt, EnvFilter};
use vetcall_core::VetCallError;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Installs the process-wide tracing subscriber
#[derive(Debug, Clone)]
pub struct DebugLogger {
    fallback_filter: String,
    with_target: bool,
}

impl DebugLogger {
    /// Create new debug logger using [`DEFAULT_FILTER`] when `RUST_LOG` is unset
    pub fn new() -> Self {
        Self {
            fallback_filter: DEFAULT_FILTER.to_string(),
            with_target: false,
        }
    }

    /// Directive used when `RUST_LOG` is unset, e.g. `"vetcall=debug"`
    pub fn fallback_filter(mut self, directive: &str) -> Self {
        self.fallback_filter = directive.to_string();
        self
    }

    /// Include the event target (module path) in each line
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Build the filter: `RUST_LOG` if set and valid, otherwise the fallback directive
    pub fn filter(&self) -> Result<EnvFilter, VetCallError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.fallback_filter).map_err(|e| {
                VetCallError::Initialization {
                    reason: format!("invalid log filter {:?}: {}", self.fallback_filter, e),
                }
            }),
        }
    }

    /// Install the subscriber
    ///
    /// Returns `Ok(false)` if a global subscriber was already installed.
    pub fn install(&self) -> Result<bool, VetCallError> {
        let filter = self.filter()?;
        let installed = fmt()
            .with_env_filter(filter)
            .with_target(self.with_target)
            .try_init()
            .is_ok();
        if installed {
            tracing::debug!("Logging initialized");
        }
        Ok(installed)
    }

    /// Initialize logging with default settings
    pub fn init_logging() -> Result<bool, VetCallError> {
        Self::new().install()
    }
}

impl Default for DebugLogger {
    fn default() -> Self {
        Self::new()
    }
}
