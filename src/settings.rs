//! Game settings
//!
//! Defaults match the shipped game; a JSON file can override any subset.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::highscores::LEADERBOARD_SIZE;
use crate::sim::{Layout, RandomPlacer, Viewport};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Tunable game parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Round length in countdown ticks
    pub initial_seconds: u32,
    pub countdown_interval_ms: u64,
    pub reposition_interval_ms: u64,

    // === Layout ===
    /// Side of the square target (px)
    pub target_size: f32,
    /// Header strip kept free for score and time (px)
    pub reserved_header: f32,

    /// Scores fetched for the end screen
    pub leaderboard_size: usize,
    /// Fixed placement seed; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            initial_seconds: INITIAL_SECONDS,
            countdown_interval_ms: COUNTDOWN_INTERVAL_MS,
            reposition_interval_ms: REPOSITION_INTERVAL_MS,

            target_size: TARGET_SIZE,
            reserved_header: RESERVED_HEADER,

            leaderboard_size: LEADERBOARD_SIZE,
            seed: None,
        }
    }
}

impl Settings {
    /// Parse from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.initial_seconds == 0 {
            return Err(SettingsError::Invalid("initial_seconds must be positive".into()));
        }
        if self.countdown_interval_ms == 0 || self.reposition_interval_ms == 0 {
            return Err(SettingsError::Invalid("timer intervals must be positive".into()));
        }
        if !(self.target_size.is_finite() && self.target_size > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "target_size must be positive, got {}",
                self.target_size
            )));
        }
        if !(self.reserved_header.is_finite() && self.reserved_header >= 0.0) {
            return Err(SettingsError::Invalid(format!(
                "reserved_header must not be negative, got {}",
                self.reserved_header
            )));
        }
        Ok(())
    }

    pub fn countdown_interval(&self) -> Duration {
        Duration::from_millis(self.countdown_interval_ms)
    }

    pub fn reposition_interval(&self) -> Duration {
        Duration::from_millis(self.reposition_interval_ms)
    }

    /// Placement bounds for a screen of this size
    pub fn layout(&self, viewport: Viewport) -> Layout {
        Layout::new(viewport, self.reserved_header, self.target_size)
    }

    pub fn placer(&self) -> RandomPlacer {
        match self.seed {
            Some(seed) => RandomPlacer::new(seed),
            None => RandomPlacer::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.initial_seconds, 30);
        assert_eq!(settings.countdown_interval(), Duration::from_secs(1));
        assert_eq!(settings.reposition_interval(), Duration::from_secs(1));
        assert_eq!(settings.leaderboard_size, 5);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "initial_seconds": 10, "seed": 7 }"#).unwrap();
        assert_eq!(settings.initial_seconds, 10);
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.target_size, TARGET_SIZE);
    }

    #[test]
    fn test_json_round_trip() {
        let settings = Settings {
            reposition_interval_ms: 750,
            ..Settings::default()
        };
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            Settings::from_json(r#"{ "initial_seconds": 0 }"#),
            Err(SettingsError::Invalid(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{ "countdown_interval_ms": 0 }"#),
            Err(SettingsError::Invalid(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{ "target_size": -1.0 }"#),
            Err(SettingsError::Invalid(_))
        ));
        assert!(matches!(
            Settings::from_json("not json"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load("/definitely/not/here/settings.json");
        assert!(matches!(err, Err(SettingsError::Io(_))));
    }
}
