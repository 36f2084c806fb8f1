//! Configuration management for Evidence Nexus
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with NEXUS__)
//! - Configuration files (config/default, config/{NEXUS_ENV}, config/local)
//! - Default values

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::Result;

/// Main configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct NexusConfig {
    /// Query and traversal defaults
    #[serde(default)]
    #[validate(nested)]
    pub engine: EngineConfig,

    /// Evidence snapshot location (used by the CLI)
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct EngineConfig {
    /// Depth used when a traversal does not name one
    #[serde(default = "default_max_depth")]
    #[validate(range(max = 64))]
    pub default_max_depth: usize,

    /// Direction used when a traversal does not name one
    #[serde(default = "default_direction")]
    pub default_direction: String,

    /// Surface parse errors instead of dropping unparseable fragments
    #[serde(default)]
    pub strict_parsing: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SnapshotConfig {
    /// Path to a JSON evidence snapshot
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logging: bool,

    /// Service name attached to log output
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Install the Prometheus recorder and render metrics on exit
    #[serde(default)]
    pub metrics_enabled: bool,
}

// Default value functions
fn default_max_depth() -> usize { crate::DEFAULT_MAX_DEPTH }
fn default_direction() -> String { "downstream".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_service_name() -> String { "evidence-nexus".to_string() }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_max_depth: default_max_depth(),
            default_direction: default_direction(),
            strict_parsing: false,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: false,
            service_name: default_service_name(),
            metrics_enabled: false,
        }
    }
}

impl NexusConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self> {
        let env = std::env::var("NEXUS_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., NEXUS__ENGINE__STRICT_PARSING=true
            .add_source(Self::environment())
            .build()?;

        Self::finish(config)
    }

    /// Load from a specific file, still honouring environment overrides
    pub fn from_file(path: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Self::environment())
            .build()?;

        Self::finish(config)
    }

    fn environment() -> Environment {
        Environment::with_prefix("NEXUS")
            .separator("__")
            .try_parsing(true)
    }

    fn finish(config: Config) -> Result<Self> {
        let parsed: NexusConfig = config.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NexusConfig::default();
        assert_eq!(config.engine.default_max_depth, 5);
        assert_eq!(config.engine.default_direction, "downstream");
        assert!(!config.engine.strict_parsing);
        assert!(config.snapshot.path.is_none());
    }

    #[test]
    fn test_depth_validation() {
        let mut config = NexusConfig::default();
        assert!(config.validate().is_ok());

        config.engine.default_max_depth = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_sources_fall_back_to_defaults() {
        let config = Config::builder().build().unwrap();
        let parsed = NexusConfig::finish(config).unwrap();
        assert_eq!(parsed.observability.service_name, "evidence-nexus");
        assert_eq!(parsed.observability.log_level, "info");
    }
}
