//! Runtime settings
//!
//! Loaded from an optional JSON file, then overridden by `ENDLESS_CROSSING_*`
//! environment variables. Any failure falls back to defaults with a warning.

use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{DEFAULT_SEED, PHYSICS_HZ};
use crate::sim::SeedMode;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// World seed; `None` picks a fresh random seed every run
    pub seed: Option<u64>,
    /// Simulation rate
    pub physics_hz: u32,
    /// Optional lane definitions overriding the randomized lanes
    pub lane_config_path: Option<PathBuf>,
    /// Where the leaderboard is kept; `None` keeps it in memory only
    pub highscores_path: Option<PathBuf>,
    /// Length of the headless autopilot session
    pub autopilot_seconds: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: Some(DEFAULT_SEED),
            physics_hz: PHYSICS_HZ,
            lane_config_path: None,
            highscores_path: None,
            autopilot_seconds: 60.0,
        }
    }
}

impl Settings {
    /// Environment variable prefix
    const ENV_PREFIX: &'static str = "ENDLESS_CROSSING_";

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// File (if any) plus process environment, never failing
    pub fn load(path: Option<&Path>) -> Self {
        let mut settings = match path {
            Some(path) => match Self::load_from(path) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(err) => {
                    log::warn!("{} ({}); using default settings", err, path.display());
                    Self::default()
                }
            },
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings
    }

    /// Apply overrides from `lookup` (the process environment in production).
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", Self::ENV_PREFIX, name));

        if let Some(value) = var("SEED") {
            if value.eq_ignore_ascii_case("random") {
                self.seed = None;
            } else {
                match value.parse() {
                    Ok(seed) => self.seed = Some(seed),
                    Err(_) => log::warn!("Ignoring invalid seed {:?}", value),
                }
            }
        }
        if let Some(value) = var("PHYSICS_HZ") {
            match value.parse::<u32>() {
                Ok(hz) if hz > 0 => self.physics_hz = hz,
                _ => log::warn!("Ignoring invalid physics rate {:?}", value),
            }
        }
        if let Some(value) = var("LANES") {
            self.lane_config_path = Some(PathBuf::from(value));
        }
        if let Some(value) = var("HIGHSCORES") {
            self.highscores_path = Some(PathBuf::from(value));
        }
        if let Some(value) = var("AUTOPILOT_SECS") {
            match value.parse::<f64>() {
                Ok(secs) if secs.is_finite() && secs >= 0.0 => self.autopilot_seconds = secs,
                _ => log::warn!("Ignoring invalid autopilot duration {:?}", value),
            }
        }
    }

    pub fn seed_mode(&self) -> SeedMode {
        match self.seed {
            Some(_) => SeedMode::Fixed,
            None => SeedMode::Varying,
        }
    }

    /// Seed for the first run
    pub fn initial_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| rand::rng().random())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.seed, Some(DEFAULT_SEED));
        assert_eq!(settings.physics_hz, 60);
        assert_eq!(settings.seed_mode(), SeedMode::Fixed);
        assert_eq!(settings.initial_seed(), DEFAULT_SEED);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "seed": 7, "lane_config_path": "lanes.json" }"#).unwrap();
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.physics_hz, PHYSICS_HZ);
        assert_eq!(settings.lane_config_path, Some(PathBuf::from("lanes.json")));
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings.apply_env(env(&[
            ("ENDLESS_CROSSING_SEED", "random"),
            ("ENDLESS_CROSSING_PHYSICS_HZ", "120"),
            ("ENDLESS_CROSSING_HIGHSCORES", "/tmp/scores.json"),
            ("ENDLESS_CROSSING_AUTOPILOT_SECS", "12.5"),
        ]));
        assert_eq!(settings.seed, None);
        assert_eq!(settings.seed_mode(), SeedMode::Varying);
        assert_eq!(settings.physics_hz, 120);
        assert_eq!(settings.highscores_path, Some(PathBuf::from("/tmp/scores.json")));
        assert_eq!(settings.autopilot_seconds, 12.5);
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut settings = Settings::default();
        settings.apply_env(env(&[
            ("ENDLESS_CROSSING_SEED", "twelve"),
            ("ENDLESS_CROSSING_PHYSICS_HZ", "0"),
            ("ENDLESS_CROSSING_AUTOPILOT_SECS", "-3"),
        ]));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_file_round_trip_and_missing_file() {
        let path = std::env::temp_dir().join(format!("endless-crossing-settings-{}.json", std::process::id()));
        let settings = Settings {
            seed: Some(99),
            ..Default::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(Settings::load_from(&path), Err(SettingsError::Io(_))));
    }
}
