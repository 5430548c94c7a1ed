//! Configuration management for puerta-sdam

use crate::description::WireVersionRange;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use crate::error::ConfigError;

/// Main puerta-sdam configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Wire protocol versions this client can speak
    #[serde(default)]
    pub compatibility: CompatibilityConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, text)
    pub format: String,
}

/// Supported wire-version range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityConfig {
    pub min_wire_version: i32,
    pub max_wire_version: i32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Default for CompatibilityConfig {
    fn default() -> Self {
        // MongoDB 3.6 through 8.0
        Self {
            min_wire_version: 6,
            max_wire_version: 25,
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        fs::write(path, content)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate compatibility range
        let compat = &self.compatibility;
        if compat.min_wire_version < 0 || compat.max_wire_version < 0 {
            return Err(ConfigError::ValidationError(
                "wire versions cannot be negative".to_string(),
            ));
        }

        if compat.min_wire_version > compat.max_wire_version {
            return Err(ConfigError::ValidationError(format!(
                "min_wire_version ({}) must not exceed max_wire_version ({})",
                compat.min_wire_version, compat.max_wire_version
            )));
        }

        // Validate logging config
        match self.logging.level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => return Err(ConfigError::ValidationError(
                format!("Invalid log level: {}", self.logging.level)
            )),
        }

        match self.logging.format.as_str() {
            "json" | "text" => {}
            _ => return Err(ConfigError::ValidationError(
                format!("Invalid log format: {}", self.logging.format)
            )),
        }

        Ok(())
    }

    pub fn wire_version_range(&self) -> WireVersionRange {
        WireVersionRange::new(
            self.compatibility.min_wire_version,
            self.compatibility.max_wire_version,
        )
    }

    /// Create example configuration file
    pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<(), ConfigError> {
        let config = Config {
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "text".to_string(),
            },
            ..Default::default()
        };

        config.save_to_file(path)
    }
}
