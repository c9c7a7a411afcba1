//! Configuration file support for liftxp.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/liftxp/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub xp: XpRules,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Log output configuration; `RUST_LOG` still takes precedence
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// XP award and leveling constants
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct XpRules {
    /// Flat award to the attribute a muscle group maps to
    #[serde(default = "default_base_award")]
    pub base_award: u64,

    /// Endurance bonus per unit of weight x reps
    #[serde(default = "default_endurance_factor")]
    pub endurance_factor: f64,

    /// Vitality awarded for every logged workout
    #[serde(default = "default_vitality_award")]
    pub vitality_award: u64,

    /// Discipline awarded on the Nth workout of the week
    #[serde(default = "default_discipline_award")]
    pub discipline_award: u64,

    /// Which workout of the week (1-based) earns the discipline award
    #[serde(default = "default_discipline_threshold")]
    pub discipline_threshold: u32,

    /// XP scale of the level curve
    #[serde(default = "default_level_divisor")]
    pub level_divisor: f64,

    /// Exponent of the level curve
    #[serde(default = "default_level_exponent")]
    pub level_exponent: f64,
}

impl Default for XpRules {
    fn default() -> Self {
        Self {
            base_award: default_base_award(),
            endurance_factor: default_endurance_factor(),
            vitality_award: default_vitality_award(),
            discipline_award: default_discipline_award(),
            discipline_threshold: default_discipline_threshold(),
            level_divisor: default_level_divisor(),
            level_exponent: default_level_exponent(),
        }
    }
}

impl XpRules {
    /// Reject rule sets that would make the level curve undefined
    pub fn validate(&self) -> Result<()> {
        if !(self.level_divisor.is_finite() && self.level_divisor > 0.0) {
            return Err(Error::Config(format!(
                "xp.level_divisor must be positive, got {}",
                self.level_divisor
            )));
        }
        if !(self.level_exponent.is_finite() && self.level_exponent > 0.0) {
            return Err(Error::Config(format!(
                "xp.level_exponent must be positive, got {}",
                self.level_exponent
            )));
        }
        if !(self.endurance_factor.is_finite() && self.endurance_factor >= 0.0) {
            return Err(Error::Config(format!(
                "xp.endurance_factor must be non-negative, got {}",
                self.endurance_factor
            )));
        }
        if self.discipline_threshold == 0 {
            return Err(Error::Config(
                "xp.discipline_threshold must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("liftxp")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_award() -> u64 {
    50
}

fn default_endurance_factor() -> f64 {
    0.1
}

fn default_vitality_award() -> u64 {
    5
}

fn default_discipline_award() -> u64 {
    20
}

fn default_discipline_threshold() -> u32 {
    3
}

fn default_level_divisor() -> f64 {
    100.0
}

fn default_level_exponent() -> f64 {
    0.7
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.xp.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("liftxp").join("config.toml")
    }
}
