//! Configuration management for the scramble CLI
//!
//! Configuration is stored in TOML format.
//!
//! # Configuration File Locations
//!
//! - Unix: `~/.config/scramble/config.toml`
//! - Windows: `%APPDATA%\scramble\config\config.toml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(std::io::Error),

    /// Refused to replace an existing config file
    #[error("Config file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// CLI configuration
///
/// # Example TOML
///
/// ```toml
/// [keys]
/// key_path = ".scramble-suit.key"
/// ring_path = ".scramble-ring.json"
/// indent = "  "
/// session_ttl_seconds = 3600
///
/// [output]
/// format = "table"  # "table" | "json" | "quiet"
/// verbose = false
///
/// [logging]
/// level = "warn"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Key file configuration
    #[serde(default)]
    pub keys: KeysConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Key file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
    /// Where `generate` and `session` write single keys
    #[serde(default = "default_key_path")]
    pub key_path: PathBuf,

    /// Where `ring` commands keep the key ring
    #[serde(default = "default_ring_path")]
    pub ring_path: PathBuf,

    /// JSON indent for written files
    #[serde(default = "default_indent")]
    pub indent: String,

    /// Lifetime of session keys when no expiry is given
    #[serde(default = "default_session_ttl")]
    pub session_ttl_seconds: u64,
}

fn default_key_path() -> PathBuf {
    PathBuf::from(".scramble-suit.key")
}

fn default_ring_path() -> PathBuf {
    PathBuf::from(".scramble-ring.json")
}

fn default_indent() -> String {
    scramble_keys::persist::DEFAULT_INDENT.to_string()
}

fn default_session_ttl() -> u64 {
    3600
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            key_path: default_key_path(),
            ring_path: default_ring_path(),
            indent: default_indent(),
            session_ttl_seconds: default_session_ttl(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format: "table", "json", "quiet"
    #[serde(default = "default_format")]
    pub format: String,

    /// Verbose output
    #[serde(default)]
    pub verbose: bool,
}

fn default_format() -> String {
    "table".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            verbose: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from custom path or default
    pub fn load_from(custom_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = custom_path {
            Self::load(path)
        } else {
            Self::load_default()
        }
    }

    /// Get default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "multiverse", "scramble")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the commented sample configuration to `path`.
    ///
    /// An existing file is only replaced when `force` is set.
    pub fn write_sample(path: &Path, force: bool) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(ConfigError::WriteError)?;
            }
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true);
        if force {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = options.open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => ConfigError::AlreadyExists(path.to_path_buf()),
            _ => ConfigError::WriteError(e),
        })?;
        std::io::Write::write_all(&mut file, Self::sample_toml().as_bytes())
            .map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_formats = ["table", "json", "quiet"];
        if !valid_formats.contains(&self.output.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid output format '{}'. Valid values: {:?}",
                self.output.format, valid_formats
            )));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}'. Valid values: {:?}",
                self.logging.level, valid_levels
            )));
        }

        if self.keys.session_ttl_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "session_ttl_seconds must be greater than 0".to_string(),
            ));
        }

        if !self.keys.indent.chars().all(|c| c == ' ' || c == '\t') {
            return Err(ConfigError::ValidationError(
                "indent may only contain spaces and tabs".to_string(),
            ));
        }

        if self.keys.key_path.as_os_str().is_empty() || self.keys.ring_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "key_path and ring_path must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Generate a sample configuration file content
    pub fn sample_toml() -> &'static str {
        r#"# Scramble CLI Configuration

[keys]
# Default file for single keys
key_path = ".scramble-suit.key"
# Default key ring file
ring_path = ".scramble-ring.json"
# JSON indent for written files
indent = "  "
# Session key lifetime when --ttl/--expires is not given
session_ttl_seconds = 3600

[output]
# Output format: "table", "json", "quiet"
format = "table"
# Enable verbose output
verbose = false

[logging]
# Log level: "error", "warn", "info", "debug", "trace"
level = "warn"
"#
    }
}

/// CLI configuration overrides
///
/// Command-line arguments take precedence over config file values.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Output format override
    pub output_format: Option<String>,
    /// Verbose flag override
    pub verbose: Option<bool>,
    /// Debug flag override
    pub debug: Option<bool>,
}

impl Config {
    /// Apply CLI overrides to configuration
    pub fn with_overrides(mut self, overrides: &CliOverrides) -> Self {
        if let Some(ref format) = overrides.output_format {
            self.output.format = format.clone();
        }
        if let Some(verbose) = overrides.verbose {
            self.output.verbose = verbose;
            if verbose && self.logging.level == "warn" {
                self.logging.level = "info".to_string();
            }
        }
        if let Some(true) = overrides.debug {
            self.logging.level = "debug".to_string();
        }
        self
    }
}
