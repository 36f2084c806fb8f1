//! Evidence Nexus Common Library
//!
//! Shared code for the Evidence Nexus crates:
//! - Error types and handling
//! - Configuration management
//! - Metrics helpers
//! - Logging initialisation

pub mod config;
pub mod errors;
pub mod metrics;
pub mod telemetry;

// Re-export commonly used types
pub use config::NexusConfig;
pub use errors::{ErrorCode, NexusError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default causal traversal depth
pub const DEFAULT_MAX_DEPTH: usize = 5;
