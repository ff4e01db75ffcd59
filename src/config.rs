// src/config.rs - Session tuning knobs, loadable from JSON
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::capo::{CapoPolicy, CAPO_MAX, CAPO_MIN};
use crate::chord::{STANDARD_TUNING, STRING_COUNT};
use crate::error::ConfigError;
use crate::features::PluckThresholds;
use crate::strum::StrumConfig;

pub const APP_NAME: &str = "air_guitar";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Height of the video the landmarks are scaled to; strums need the wrist inside it.
    pub frame_height: f64,
    pub classify_timeout_ms: u64,
    pub pluck_thresholds: PluckThresholds,
    pub strum: StrumConfig,
    pub capo_policy: CapoPolicy,
    /// Frames between pose capo checks (30 ≈ once a second at 30fps).
    pub auto_capo_interval: u64,
    pub initial_capo: i8,
    pub tuning: [u8; STRING_COUNT],
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_height: 480.0,
            classify_timeout_ms: 100,
            pluck_thresholds: PluckThresholds::default(),
            strum: StrumConfig::default(),
            capo_policy: CapoPolicy::Manual,
            auto_capo_interval: 30,
            initial_capo: 0,
            tuning: STANDARD_TUNING,
        }
    }
}

impl SessionConfig {
    pub fn classify_timeout(&self) -> Duration {
        Duration::from_millis(self.classify_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.frame_height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "frame height must be positive, got {}",
                self.frame_height
            )));
        }
        if self.strum.window < 2 {
            return Err(ConfigError::Invalid("strum window needs at least 2 samples".into()));
        }
        if !(CAPO_MIN..=CAPO_MAX).contains(&self.initial_capo) {
            return Err(ConfigError::Invalid(format!(
                "initial capo {} outside [{}, {}]",
                self.initial_capo, CAPO_MIN, CAPO_MAX
            )));
        }
        if self.tuning.iter().any(|&p| p > 115) {
            return Err(ConfigError::Invalid(format!("tuning {:?} leaves no room to fret", self.tuning)));
        }
        Ok(())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: SessionConfig = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from the per-user config directory, falling back to defaults.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => match Self::from_file(&path) {
                Ok(config) => config,
                Err(e) => {
                    warn!("{}. Using defaults.", e);
                    Self::default()
                }
            },
            _ => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"frame_height": 720.0, "capo_policy": "pose_auto", "strum": {"window": 8}}"#)
                .unwrap();
        assert_eq!(config.frame_height, 720.0);
        assert_eq!(config.capo_policy, CapoPolicy::PoseAuto);
        assert_eq!(config.strum.window, 8);
        assert_eq!(config.strum.angle_threshold, 3.0);
        assert_eq!(config.tuning, STANDARD_TUNING);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn stale_frame_width_key_is_ignored() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"frame_width": 1280.0, "frame_height": 720.0}"#).unwrap();
        assert_eq!(config.frame_height, 720.0);
        assert_eq!(config.classify_timeout_ms, 100);
    }

    #[test]
    fn validation_catches_nonsense() {
        let mut config = SessionConfig::default();
        config.frame_height = 0.0;
        assert!(config.validate().is_err());

        let mut config = SessionConfig::default();
        config.initial_capo = 13;
        assert!(config.validate().is_err());

        let mut config = SessionConfig::default();
        config.strum.window = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let err = SessionConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
