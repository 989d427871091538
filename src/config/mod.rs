//! Configuration module for flowmacro
//!
//! This module handles engine configuration:
//! - Where relative definition handles are looked up
//! - Executor limits (tick budget, tick rate)
//! - Logging (filter, optional log directory)
//!
//! # Config Location
//!
//! The default config file lives in the platform-appropriate data directory
//! under `dev.flowmacro`:
//! - **Linux**: `~/.local/share/dev.flowmacro/`
//! - **macOS**: `~/Library/Application Support/dev.flowmacro/`
//! - **Windows**: `%APPDATA%\dev.flowmacro\`
//!
//! # Example
//!
//! ```ignore
//! use flowmacro::config::EngineConfig;
//!
//! let mut config = EngineConfig::load_or_default();
//! config.definition_dirs.push("./definitions".into());
//! config.save_default()?;
//! ```

use crate::error::{MacroError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.flowmacro";

/// Config filename
pub const CONFIG_FILE: &str = "config.json";

/// Subdirectory of the data directory searched for definitions
pub const DEFINITIONS_DIR: &str = "definitions";

/// Default executor tick budget
pub const DEFAULT_MAX_TICKS: u64 = 1_000_000;

/// Default log filter
pub const DEFAULT_LOG_FILTER: &str = "info,flowmacro=debug";

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Executor Config ====================

/// Limits for running a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Ticks after which a run that has not drained is aborted
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Ticks per second; 0 runs unthrottled
    #[serde(default)]
    pub tick_rate_hz: u32,
}

fn default_max_ticks() -> u64 {
    DEFAULT_MAX_TICKS
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_ticks: DEFAULT_MAX_TICKS,
            tick_rate_hz: 0,
        }
    }
}

// ==================== Logging Config ====================

/// Logging preferences for the binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when no env override is set
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// When set, logs are also written to daily files in this directory
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            log_dir: None,
        }
    }
}

// ==================== Engine Config ====================

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Version for future migration support
    #[serde(default = "default_config_version")]
    pub version: u32,

    /// Directories searched, in order, for relative definition handles
    #[serde(default = "default_definition_dirs")]
    pub definition_dirs: Vec<PathBuf>,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_config_version() -> u32 {
    1
}

fn default_definition_dirs() -> Vec<PathBuf> {
    app_data_dir()
        .map(|dir| vec![dir.join(DEFINITIONS_DIR)])
        .unwrap_or_default()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: 1,
            definition_dirs: default_definition_dirs(),
            executor: ExecutorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MacroError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            MacroError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Load the config from the default location, returning defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the config to disk as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MacroError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| MacroError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            MacroError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Save the config to the default location
    pub fn save_default(&self) -> Result<()> {
        let path = config_path().ok_or_else(|| {
            MacroError::Config("Could not determine app data directory".to_string())
        })?;
        self.save(path)
    }

    /// Add a definition search directory (builder style)
    pub fn with_definition_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.definition_dirs.push(dir.into());
        self
    }
}
