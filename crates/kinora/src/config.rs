//! # Indexer Configuration
//!
//! TOML configuration of the indexer binary.
//!
//! ```toml
//! [indexer]
//! contract_address = "0x..."
//! start_block = 0
//! channel_buffer = 1024
//! max_read_retries = 3
//!
//! [metadata]
//! enabled = true
//! directory = "metadata"
//! channel_buffer = 256
//!
//! [logging]
//! level = "info"
//! json = false
//! ```
//!
//! Only `indexer.contract_address` is required. Unknown keys are rejected so
//! a typo never silently falls back to a default.

use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use kinora_indexer::{ListenerConfig, PipelineConfig};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid configuration TOML.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config value {field}: {reason}")]
    Invalid {
        /// Offending key.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Event processing.
    pub indexer: IndexerConfig,
    /// Metadata hydration.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[indexer]` section.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexerConfig {
    /// Quest contract whose events and state are indexed.
    pub contract_address: Address,
    /// Events from earlier blocks are ignored.
    #[serde(default)]
    pub start_block: u64,
    /// Event channel capacity.
    #[serde(default = "default_event_buffer")]
    pub channel_buffer: usize,
    /// Extra attempts for events whose reads failed transiently.
    #[serde(default = "default_read_retries")]
    pub max_read_retries: u32,
}

/// `[metadata]` section.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataConfig {
    /// Whether activated documents are hydrated.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Directory holding `<content id>.json` documents.
    #[serde(default = "default_metadata_directory")]
    pub directory: PathBuf,
    /// Activation channel capacity.
    #[serde(default = "default_metadata_buffer")]
    pub channel_buffer: usize,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_metadata_directory(),
            channel_buffer: default_metadata_buffer(),
        }
    }
}

/// `[logging]` section.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_true() -> bool { true }
fn default_event_buffer() -> usize { 1024 }
fn default_read_retries() -> u32 { 3 }
fn default_metadata_directory() -> PathBuf { PathBuf::from("metadata") }
fn default_metadata_buffer() -> usize { 256 }
fn default_level() -> String { "info".to_string() }

impl Config {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for malformed TOML, unknown keys, bad
    /// addresses and out-of-range values.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is unreadable or invalid.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.indexer.contract_address == Address::ZERO {
            return Err(ConfigError::Invalid {
                field: "indexer.contract_address",
                reason: "must not be the zero address",
            });
        }
        if self.indexer.channel_buffer == 0 {
            return Err(ConfigError::Invalid {
                field: "indexer.channel_buffer",
                reason: "must be at least 1",
            });
        }
        if self.metadata.channel_buffer == 0 {
            return Err(ConfigError::Invalid {
                field: "metadata.channel_buffer",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Listener settings.
    #[must_use]
    pub fn listener_config(&self) -> ListenerConfig {
        ListenerConfig {
            contract_address: self.indexer.contract_address,
            channel_buffer: self.indexer.channel_buffer,
        }
    }

    /// Pipeline settings.
    #[must_use]
    pub const fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            start_block: self.indexer.start_block,
            max_read_retries: self.indexer.max_read_retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0x1111111111111111111111111111111111111111";

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config =
            Config::from_toml_str(&format!("[indexer]\ncontract_address = \"{ADDRESS}\"\n")).unwrap();

        assert_eq!(config.indexer.contract_address, Address::repeat_byte(0x11));
        assert_eq!(config.indexer.channel_buffer, 1024);
        assert_eq!(config.indexer.max_read_retries, 3);
        assert_eq!(config.metadata, MetadataConfig::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let source = format!("[indexer]\ncontract_address = \"{ADDRESS}\"\nstart_blok = 5\n");
        assert!(matches!(Config::from_toml_str(&source), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_buffer_is_rejected() {
        let source = format!("[indexer]\ncontract_address = \"{ADDRESS}\"\nchannel_buffer = 0\n");
        assert!(matches!(
            Config::from_toml_str(&source),
            Err(ConfigError::Invalid { field: "indexer.channel_buffer", .. })
        ));
    }
}
