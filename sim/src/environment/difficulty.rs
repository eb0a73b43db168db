//! Difficulty tiers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Nightmare,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyMultipliers {
    pub spawn_rate: f32,
    pub damage: f32,
    pub health: f32,
    pub experience: f32,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Nightmare,
    ];

    pub fn multipliers(self) -> DifficultyMultipliers {
        let (spawn_rate, damage, health, experience) = match self {
            Difficulty::Easy => (0.75, 0.6, 0.8, 0.8),
            Difficulty::Normal => (1.0, 1.0, 1.0, 1.0),
            Difficulty::Hard => (1.3, 1.4, 1.25, 1.3),
            Difficulty::Nightmare => (1.6, 2.0, 1.5, 1.75),
        };
        DifficultyMultipliers {
            spawn_rate,
            damage,
            health,
            experience,
        }
    }
}
