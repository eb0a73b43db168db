//! Environmental simulation.
//!
//! One `Environment` resource holds the clock, weather, biome, world events
//! and difficulty. Only the environment systems write it; everything else
//! reads the derived multipliers below.

pub mod biome;
pub mod difficulty;
pub mod events;
pub mod time;
pub mod weather;

pub use biome::{BiomeKind, BiomeState, BiomeZone};
pub use difficulty::{Difficulty, DifficultyMultipliers};
pub use events::{ActiveEvent, EventChanges, EventModifiers, WorldEventKind, WorldEvents};
pub use time::{DayPhase, TimeOfDay};
pub use weather::{WeatherKind, WeatherProfile, WeatherState};

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Lighting values handed to presentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lighting {
    pub sun_angle: f32,
    pub sun_intensity: f32,
    pub ambient_light: f32,
    pub fog_density: f32,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct Environment {
    pub time: TimeOfDay,
    pub weather: WeatherState,
    pub biome: BiomeState,
    pub difficulty: Difficulty,
    pub events: WorldEvents,
}

impl Environment {
    pub fn new(time: TimeOfDay, difficulty: Difficulty) -> Self {
        Self {
            time,
            difficulty,
            ..Default::default()
        }
    }

    /// Clock lighting adjusted by weather fog and active events.
    pub fn lighting(&self) -> Lighting {
        let modifiers = self.events.modifiers();
        Lighting {
            sun_angle: self.time.sun_angle,
            sun_intensity: self.time.sun_intensity,
            ambient_light: (self.time.ambient_light * modifiers.ambient).clamp(0.0, 1.0),
            fog_density: (self.time.fog_density + self.weather.profile.fog_density * 0.5 + modifiers.fog)
                .clamp(0.0, 1.0),
        }
    }

    /// Weather visibility with event penalties, in `[0, 1]`.
    pub fn visibility(&self) -> f32 {
        (self.weather.profile.visibility * self.events.modifiers().visibility).clamp(0.0, 1.0)
    }

    /// Factor on awareness radii: full range in clear air, half in zero
    /// visibility.
    pub fn awareness_scale(&self) -> f32 {
        0.5 + 0.5 * self.visibility()
    }

    /// Damage multiplier for creature attacks.
    pub fn enemy_damage_multiplier(&self) -> f32 {
        self.difficulty.multipliers().damage * self.events.modifiers().damage
    }

    pub fn experience_multiplier(&self) -> f32 {
        self.difficulty.multipliers().experience * self.events.modifiers().experience
    }

    /// Weather slow-down, never above 1.
    pub fn movement_multiplier(&self) -> f32 {
        self.weather.profile.movement.clamp(0.0, 1.0)
    }

    pub fn active_events(&self) -> Vec<WorldEventKind> {
        self.events.active.iter().map(|e| e.kind).collect()
    }
}
