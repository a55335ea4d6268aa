//! Configuration file support for Micro-Gym.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/micro-gym/config.toml`.
//! The sprint itself (start date, targets, rotation) lives in the tracked
//! document, not here; this file only carries where data is kept and the
//! tunable reward rules.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub rules: RulesConfig,
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

/// Reward rules for the gamification engine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RulesConfig {
    /// Perfect days needed in one ISO week to satisfy the weekly quest
    #[serde(default = "default_weekly_quest_target")]
    pub weekly_quest_target: u32,

    /// Daily XP goal shown next to today's XP
    #[serde(default = "default_daily_xp_goal")]
    pub daily_xp_goal: u64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            weekly_quest_target: default_weekly_quest_target(),
            daily_xp_goal: default_daily_xp_goal(),
        }
    }
}

impl RulesConfig {
    /// Reject rule values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.weekly_quest_target == 0 || self.weekly_quest_target > 7 {
            return Err(Error::Config(format!(
                "weekly_quest_target must be between 1 and 7, got {}",
                self.weekly_quest_target
            )));
        }
        Ok(())
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("micro-gym")
}

fn default_weekly_quest_target() -> u32 {
    3
}

fn default_daily_xp_goal() -> u64 {
    100
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.rules.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("micro-gym").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.rules.weekly_quest_target, 3);
        assert_eq!(config.rules.daily_xp_goal, 100);
        assert!(config.data.data_dir.ends_with("micro-gym"));
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[rules]
weekly_quest_target = 4
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.rules.weekly_quest_target, 4);
        assert_eq!(config.rules.daily_xp_goal, 100); // default
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.rules.daily_xp_goal = 150;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.rules, config.rules);
    }

    #[test]
    fn test_invalid_weekly_target_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[rules]\nweekly_quest_target = 0\n").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
