//! Configuration management for the candle tutor.
//!
//! Loads configuration from TOML files. Every section falls back to defaults,
//! so a partial file only needs the keys it changes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use tutor_indicators::{MacdConfig, RsiConfig};
use tutor_ta::{LevelValidator, StructureDetector};

/// File name searched in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "tutor.toml";

/// Directory under the platform config dir.
pub const APP_DIR: &str = "candle-tutor";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub indicators: IndicatorsConfig,
    pub validation: ValidationConfig,
    pub structure: StructureDetector,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from default locations.
    ///
    /// Searches in order:
    /// 1. `./tutor.toml`
    /// 2. `<config dir>/candle-tutor/config.toml`
    ///
    /// Returns default config if no file is found. A file that exists but
    /// fails to parse is logged and skipped.
    pub fn load_default() -> Self {
        let candidates = std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE)).chain(Self::user_path());

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::load(&path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => log::warn!("Ignoring config {}: {}", path.display(), e),
            }
        }

        Self::default()
    }

    /// Save configuration to a file path.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        PathBuf::from(LOCAL_CONFIG_FILE)
    }

    /// Per-user config file, if the platform has a config directory.
    pub fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }
}

/// General application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// User id for progress keys; anonymous when unset.
    pub user_id: Option<String>,
    /// Number of synthetic candles to generate when no data file is given.
    pub candle_count: usize,
    /// Spacing of synthetic candles in milliseconds.
    pub interval_ms: i64,
    /// Starting price of synthetic candles.
    pub base_price: f64,
    /// RNG seed for reproducible synthetic data.
    pub seed: Option<u64>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            user_id: None,
            candle_count: 60,
            interval_ms: 15 * 60 * 1000,
            base_price: 100.0,
            seed: None,
        }
    }
}

/// Indicator parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorsConfig {
    pub rsi: RsiConfig,
    pub macd: MacdConfig,
}

/// Pattern and level validation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub level: LevelValidator,
    /// Window for the rough support/resistance estimate.
    pub support_resistance_lookback: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            level: LevelValidator::default(),
            support_resistance_lookback: 20,
        }
    }
}
