//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! for every host embedding the shared-variable store.
//!
//! # Usage
//!
//! ```rust,no_run
//! use gio_common::config::{ConfigError, ConfigLoader, IpcConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = IpcConfig::load(Path::new("gio.toml"))?;
//!     config.validate()?;
//!     println!("Shared file: {}", config.store.file_path().display());
//!     Ok(())
//! }
//! ```

use crate::consts::{DEFAULT_SHARED_FILE, SHARED_DIR_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields shared by every host.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "demo-app"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Host application identifier. Must not be empty.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_file_name() -> String {
    DEFAULT_SHARED_FILE.to_string()
}

const fn default_multi_process() -> bool {
    true
}

/// Location and mode of the shared-variable file.
///
/// # TOML Example
///
/// ```toml
/// [store]
/// directory = "/data/user/0/com.example/files"
/// file_name = "gio.core.ipc.1"
/// multi_process = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Private files directory of the host application.
    pub directory: PathBuf,

    /// Shared file name; carries the schema version suffix.
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Share variables with sibling processes. When `false` every
    /// accessor works on the in-process cache only.
    #[serde(default = "default_multi_process")]
    pub multi_process: bool,
}

impl StoreConfig {
    /// Config pointing at `directory` with default file name and mode.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            file_name: default_file_name(),
            multi_process: default_multi_process(),
        }
    }

    /// Full path of the shared file: `directory/.gio.dir/file_name`.
    pub fn file_path(&self) -> PathBuf {
        self.directory.join(SHARED_DIR_NAME).join(&self.file_name)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `directory` is empty
    /// - `file_name` is empty or contains a path separator
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.directory.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "store.directory cannot be empty".to_string(),
            ));
        }
        if self.file_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "store.file_name cannot be empty".to_string(),
            ));
        }
        if self.file_name.contains('/') || self.file_name.contains('\\') {
            return Err(ConfigError::ValidationError(format!(
                "store.file_name must be a bare file name, got {:?}",
                self.file_name
            )));
        }
        Ok(())
    }
}

/// Top-level configuration file for a host embedding the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcConfig {
    /// Common settings.
    pub shared: SharedConfig,
    /// Shared file settings.
    pub store: StoreConfig,
}

impl IpcConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.store.validate()
    }
}

/// Trait for loading configuration from TOML files.
///
/// This trait provides a default implementation that works with any type
/// implementing `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
