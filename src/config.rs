//! Crop Configuration Module
//!
//! Per-deployment configuration loaded from TOML, covering the boundary
//! policy selection, clamping behavior, feed ordering, and server/storage
//! paths.
//!
//! ## Loading Order
//!
//! 1. `VERDE_CONFIG` environment variable (path to TOML file)
//! 2. `verde_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! // In main():
//! config::init(CropConfig::load());
//!
//! // Anywhere in the codebase:
//! let policy = config::get().cycle.policy;
//! ```

use crate::cycle::{ClampPolicy, CyclePolicy};
use crate::types::SortDirection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("cannot parse config file {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a grow deployment.
///
/// Load with `CropConfig::load()` which searches:
/// 1. `$VERDE_CONFIG` env var
/// 2. `./verde_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CropConfig {
    /// Crop identification
    #[serde(default)]
    pub crop: CropInfo,

    /// Cycle boundary policy and day-number handling
    #[serde(default)]
    pub cycle: CycleConfig,

    /// Feed ordering
    #[serde(default)]
    pub feed: FeedConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Persistent storage paths
    #[serde(default)]
    pub storage: StorageConfig,
}

impl CropConfig {
    /// Load configuration using the standard search order:
    /// 1. `$VERDE_CONFIG` environment variable
    /// 2. `./verde_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var("VERDE_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), crop = %config.crop.name, "Loaded crop config from VERDE_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from VERDE_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "VERDE_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./verde_config.toml
        let local = PathBuf::from("verde_config.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(crop = %config.crop.name, "Loaded crop config from ./verde_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./verde_config.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No verde_config.toml found — using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot drive the pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle.expected_duration_days == 0 {
            return Err(ConfigError::Invalid(
                "cycle.expected_duration_days must be at least 1".to_string(),
            ));
        }
        if self.server.addr.trim().is_empty() {
            return Err(ConfigError::Invalid("server.addr must not be empty".to_string()));
        }
        if self.storage.data_dir.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "storage.data_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Crop identification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropInfo {
    /// Crop name for logs and the API surface
    #[serde(default = "default_crop_name")]
    pub name: String,

    /// Optional cultivar / variety label
    #[serde(default)]
    pub variety: String,
}

fn default_crop_name() -> String {
    "lettuce".to_string()
}

impl Default for CropInfo {
    fn default() -> Self {
        Self {
            name: default_crop_name(),
            variety: String::new(),
        }
    }
}

/// Cycle boundary policy and day-number handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Which boundary lifecycle policy this deployment runs
    #[serde(default = "default_policy")]
    pub policy: CyclePolicy,

    /// Floor non-positive day numbers at 1 (clock-skew guard)
    #[serde(default = "default_true")]
    pub clamp_non_positive: bool,

    /// Standard growth duration of the crop in days
    #[serde(default = "default_duration")]
    pub expected_duration_days: u32,
}

fn default_policy() -> CyclePolicy {
    CyclePolicy::Multi
}

fn default_true() -> bool {
    true
}

fn default_duration() -> u32 {
    crate::stage::EXPECTED_CYCLE_DAYS
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            clamp_non_positive: default_true(),
            expected_duration_days: default_duration(),
        }
    }
}

impl CycleConfig {
    /// The clamp policy implied by this configuration.
    #[must_use]
    pub fn clamp_policy(&self) -> ClampPolicy {
        if self.clamp_non_positive {
            ClampPolicy::ClampToOne
        } else {
            ClampPolicy::Propagate
        }
    }
}

/// Feed ordering
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Direction the classified table is ordered in
    #[serde(default)]
    pub sort: SortDirection,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_addr")]
    pub addr: String,
}

fn default_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

/// Persistent storage paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the boundary store
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

// ============================================================================
// Global access
// ============================================================================

/// Global crop configuration, initialized once at startup.
static CROP_CONFIG: OnceLock<CropConfig> = OnceLock::new();

/// Initialize the global crop configuration.
///
/// Must be called exactly once before any calls to `get()`.
pub fn init(config: CropConfig) {
    if CROP_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once — ignoring");
    }
}

/// Get a reference to the global crop configuration.
///
/// Panics if `init()` has not been called. This is by design — a missing
/// config is a fatal startup error, not a recoverable condition.
pub fn get() -> &'static CropConfig {
    CROP_CONFIG
        .get()
        .expect("config::get() before config::init(); initialize at startup")
}

/// Check whether the config has been initialized.
///
/// Useful for tests and optional config paths.
pub fn is_initialized() -> bool {
    CROP_CONFIG.get().is_some()
}
