// src/config/loader.rs
//! Layered configuration loader: defaults, TOML files, then environment

use crate::config::SystemConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variables with this prefix override file values,
/// e.g. `EMG_ASSIST__ASSIST__NOTCH_FREQ_HZ=50`
pub const DEFAULT_ENV_PREFIX: &str = "EMG_ASSIST";

const ENV_SEPARATOR: &str = "__";

/// Configuration loader
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    env_prefix: String,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Configuration validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err.to_string())
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create loader searching the standard locations
    pub fn new() -> Self {
        Self::with_paths(Self::discover_config_paths())
    }

    /// Create loader with custom paths, later paths override earlier ones
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    /// Use a different environment variable prefix
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    /// Load, merge and validate the system configuration
    pub fn load(&self) -> Result<SystemConfig, ConfigError> {
        let defaults = config::Config::try_from(&SystemConfig::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        for path in &self.config_paths {
            builder = builder.add_source(
                config::File::from(path.as_path())
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

        let system_config: SystemConfig = builder.build()?.try_deserialize()?;
        system_config
            .validate_consistency()
            .map_err(ConfigError::Validation)?;

        tracing::debug!(paths = ?self.config_paths, "configuration loaded");
        Ok(system_config)
    }

    /// Load a single required TOML file, without environment overrides
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<SystemConfig, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let system_config: SystemConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        system_config
            .validate_consistency()
            .map_err(ConfigError::Validation)?;
        Ok(system_config)
    }

    /// Export a configuration as pretty TOML
    pub fn export_config<P: AsRef<Path>>(config: &SystemConfig, path: P) -> Result<(), ConfigError> {
        let toml_content =
            toml::to_string_pretty(config).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Paths this loader reads, in override order
    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    fn discover_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("/etc/emg-assist/config.toml")];
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(PathBuf::from(home).join(".config/emg-assist/config.toml"));
        }
        paths.push(PathBuf::from("emg-assist.toml"));
        paths
    }
}
