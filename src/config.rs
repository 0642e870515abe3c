//! Configuration loading and management
//!
//! Handles parsing of the `config.toml` file in the data directory.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Household timezone (IANA name). Civil dates and due times are
    /// interpreted here; persisted instants are always UTC.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Status sweep configuration
    #[serde(default)]
    pub sweep: SweepConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            sweep: SweepConfig::default(),
        }
    }
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

/// Status sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// How many days back from today the sweep scans for instances
    /// needing a status transition.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

fn default_window_days() -> u32 {
    30
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
        }
    }
}

impl Config {
    /// Load configuration from a `config.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the data directory, or return defaults
    pub fn load_from(storage: &crate::storage::Storage) -> Self {
        let config_path = storage.config_file();
        if config_path.exists() {
            Self::load(&config_path).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        crate::lock::write_atomic(path, content.as_bytes())
    }

    /// The household timezone, parsed from the configured IANA name
    pub fn household_tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(chrono_tz::America::New_York)
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.timezone.parse::<Tz>().is_err() {
            return Err(crate::error::Error::InvalidConfig(format!(
                "timezone: unknown IANA timezone '{}'",
                self.timezone
            )));
        }
        if self.sweep.window_days == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "sweep.window_days must be >= 1".to_string(),
            ));
        }
        if self.sweep.window_days > 366 {
            return Err(crate::error::Error::InvalidConfig(
                "sweep.window_days must be <= 366".to_string(),
            ));
        }
        Ok(())
    }
}
