//! Logging initialisation
//!
//! Installs a `tracing-subscriber` formatter driven by `ObservabilityConfig`.
//! `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;
use crate::errors::{NexusError, Result};

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| NexusError::Validation {
            message: format!("invalid log level `{}`: {}", config.log_level, e),
            field: Some("observability.log_level".to_string()),
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = if config.json_logging {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| NexusError::Internal {
        message: format!("failed to install tracing subscriber: {}", e),
    })
}
