//! Simulation tuning.
//!
//! Every field has a default, so a TOML file only needs the values it
//! changes:
//!
//! ```toml
//! seed = 7
//! difficulty = "hard"
//!
//! [spawner]
//! base_max = 32
//! ```

use crate::components::SpeciesKind;
use crate::environment::Difficulty;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Default tuning file path.
pub const DEFAULT_CONFIG_PATH: &str = "untamed.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub seed: u64,
    /// Behavioural updates per second.
    pub ai_rate_hz: f32,
    /// Upper bound on behavioural updates run in one tick.
    pub max_ai_steps_per_tick: u32,
    pub world_half_extent: f32,
    pub grid_cell_size: f32,
    pub start_hour: f32,
    /// Game seconds per real second.
    pub time_scale: f32,
    pub difficulty: Difficulty,
    /// Seconds between proximity combat passes.
    pub combat_interval: f32,
    /// Distance at which an attacking predator reaches the observer.
    pub contact_distance: f32,
    pub counter_attack_delay: f32,
    pub pickup_radius: f32,
    /// Seconds a curse slow lasts; refreshed on every hit.
    pub curse_duration: f32,
    pub spawner: SpawnerConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            ai_rate_hz: 20.0,
            max_ai_steps_per_tick: 4,
            world_half_extent: 512.0,
            grid_cell_size: 16.0,
            start_hour: 8.0,
            time_scale: 60.0,
            difficulty: Difficulty::Normal,
            combat_interval: 0.1,
            contact_distance: 2.0,
            counter_attack_delay: 0.6,
            pickup_radius: 1.5,
            curse_duration: 3.0,
            spawner: SpawnerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Population ceiling at spawn-rate multiplier 1.
    pub base_max: u32,
    pub inner_radius: f32,
    pub outer_radius: f32,
    /// Closest a new spawn may land to anything already placed.
    pub min_spacing: f32,
    pub max_attempts: u32,
    /// Deaths further than this from the observer award nothing.
    pub xp_radius: f32,
    pub predator_share_day: f64,
    pub predator_share_night: f64,
    pub predator_xp: f32,
    pub prey_xp: f32,
    pub predator_currency: u32,
    pub prey_currency: u32,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            base_max: 24,
            inner_radius: 30.0,
            outer_radius: 80.0,
            min_spacing: 4.0,
            max_attempts: 8,
            xp_radius: 40.0,
            predator_share_day: 0.3,
            predator_share_night: 0.5,
            predator_xp: 25.0,
            prey_xp: 10.0,
            predator_currency: 5,
            prey_currency: 2,
        }
    }
}

impl SpawnerConfig {
    /// `floor(base_max × spawn_rate)`.
    pub fn population_ceiling(&self, spawn_rate: f32) -> usize {
        let rate = if spawn_rate.is_finite() { spawn_rate.max(0.0) } else { 0.0 };
        (self.base_max as f32 * rate).floor() as usize
    }

    /// Chance that a new spawn is a predator, sanitised to `0..=1`.
    pub fn predator_share(&self, night: bool) -> f64 {
        let share = if night {
            self.predator_share_night
        } else {
            self.predator_share_day
        };
        if share.is_finite() {
            share.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn base_experience(&self, kind: SpeciesKind) -> f32 {
        match kind {
            SpeciesKind::Predator => self.predator_xp,
            _ => self.prey_xp,
        }
    }

    pub fn base_currency(&self, kind: SpeciesKind) -> u32 {
        match kind {
            SpeciesKind::Predator => self.predator_currency,
            _ => self.prey_currency,
        }
    }
}

impl SimConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from the default path, or fall back to defaults.
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_CONFIG_PATH).unwrap_or_else(|e| {
            warn!(error = %e, path = DEFAULT_CONFIG_PATH, "using default config");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimConfig::from_toml_str(
            r#"
            seed = 7
            difficulty = "hard"

            [spawner]
            base_max = 32
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.spawner.base_max, 32);
        assert_eq!(config.spawner.max_attempts, 8);
        assert_eq!(config.ai_rate_hz, 20.0);
    }

    #[test]
    fn test_bad_toml_is_a_parse_error() {
        let err = SimConfig::from_toml_str("seed = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = SimConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_predator_share_is_sanitised() {
        let config = SimConfig::from_toml_str(
            r#"
            [spawner]
            predator_share_day = nan
            predator_share_night = 1.5
            "#,
        )
        .unwrap();
        assert_eq!(config.spawner.predator_share(false), 0.0);
        assert_eq!(config.spawner.predator_share(true), 1.0);
        assert_eq!(SpawnerConfig::default().predator_share(false), 0.3);
    }

    #[test]
    fn test_population_ceiling_floors() {
        let spawner = SpawnerConfig::default();
        assert_eq!(spawner.population_ceiling(1.0), 24);
        assert_eq!(spawner.population_ceiling(0.75), 18);
        assert_eq!(spawner.population_ceiling(1.3), 31);
        assert_eq!(spawner.population_ceiling(f32::NAN), 0);
    }
}
