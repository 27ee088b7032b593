//! Service configuration
//!
//! Loaded from TOML. Every section has defaults, so an empty file is a valid
//! configuration.
//!
//! ```toml
//! [pagination]
//! default_limit = 50
//! max_limit = 1000
//!
//! [notifier]
//! channel_capacity = 1024
//! send_timeout_ms = 1000
//!
//! [logging]
//! level = "info"
//! ```

use crate::{FleetError, PagePolicy, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    /// Listing page bounds
    pub pagination: PaginationConfig,
    /// Change notification channel
    pub notifier: NotifierConfig,
    /// Log output
    pub logging: LoggingConfig,
}

/// Page size bounds for every listing operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    /// Page size used when the caller omits `limit`
    pub default_limit: u64,
    /// Largest `limit` honoured; larger requests are clamped
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        let policy = PagePolicy::default();
        Self {
            default_limit: policy.default_limit,
            max_limit: policy.max_limit,
        }
    }
}

impl PaginationConfig {
    /// Page bounds derived from this section
    pub fn policy(&self) -> PagePolicy {
        PagePolicy {
            default_limit: self.default_limit,
            max_limit: self.max_limit,
        }
    }
}

/// In-process event channel settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifierConfig {
    /// Bounded channel size
    pub channel_capacity: usize,
    /// How long a publish waits for room in a full channel
    pub send_timeout_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            send_timeout_ms: 1000,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter level
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl FleetConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| FleetError::config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FleetError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        let pagination = &self.pagination;
        if pagination.default_limit == 0 {
            return Err(FleetError::config("pagination.default_limit must be positive"));
        }
        if pagination.default_limit > pagination.max_limit {
            return Err(FleetError::config(format!(
                "pagination.default_limit ({}) exceeds pagination.max_limit ({})",
                pagination.default_limit, pagination.max_limit
            )));
        }
        if self.notifier.channel_capacity == 0 {
            return Err(FleetError::config("notifier.channel_capacity must be positive"));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(FleetError::config(format!(
                "logging.level must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }
        Ok(())
    }
}
