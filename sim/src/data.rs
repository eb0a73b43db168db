//! Static species, spawn and resource tables.

use crate::components::*;
use crate::environment::BiomeKind;
use glam::Vec3;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::SmallRng;

/// Stats for one spawnable species.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: SpeciesKind,
    pub max_health: f32,
    pub max_stamina: f32,
    pub speed: f32,
    pub damage: f32,
    pub attack_range: f32,
    pub attack_speed: f32,
    pub awareness: f32,
    pub effect: Option<(EnemyEffectKind, f32)>,
}

const fn predator(
    id: &'static str,
    name: &'static str,
    stats: [f32; 7],
    effect: Option<(EnemyEffectKind, f32)>,
) -> SpeciesTemplate {
    SpeciesTemplate {
        id,
        name,
        kind: SpeciesKind::Predator,
        max_health: stats[0],
        max_stamina: stats[1],
        speed: stats[2],
        damage: stats[3],
        attack_range: stats[4],
        attack_speed: stats[5],
        awareness: stats[6],
        effect,
    }
}

const fn prey(id: &'static str, name: &'static str, health: f32, stamina: f32, speed: f32, awareness: f32) -> SpeciesTemplate {
    SpeciesTemplate {
        id,
        name,
        kind: SpeciesKind::Prey,
        max_health: health,
        max_stamina: stamina,
        speed,
        damage: 0.0,
        attack_range: 1.0,
        attack_speed: 0.0,
        awareness,
        effect: None,
    }
}

//                                      health stamina speed dmg  range rate aware
pub static SPECIES: [SpeciesTemplate; 10] = [
    predator("wolf", "Wolf", [50.0, 80.0, 5.5, 8.0, 1.5, 1.0, 14.0], None),
    predator("bear", "Bear", [120.0, 60.0, 4.5, 15.0, 2.0, 0.7, 10.0], Some((EnemyEffectKind::Rage, 1.5))),
    predator("scorpion", "Giant Scorpion", [35.0, 50.0, 4.0, 6.0, 1.3, 1.2, 9.0], Some((EnemyEffectKind::Curse, 0.6))),
    predator("swamp_leech", "Swamp Leech", [30.0, 40.0, 3.5, 5.0, 1.2, 1.0, 8.0], Some((EnemyEffectKind::Split, 2.0))),
    predator("snow_lynx", "Snow Lynx", [45.0, 70.0, 6.0, 9.0, 1.5, 1.1, 16.0], None),
    prey("deer", "Deer", 40.0, 60.0, 5.0, 15.0),
    prey("rabbit", "Rabbit", 15.0, 40.0, 6.0, 12.0),
    prey("goat", "Mountain Goat", 35.0, 70.0, 4.5, 12.0),
    prey("lizard", "Sand Lizard", 20.0, 50.0, 5.0, 10.0),
    prey("frog", "Bog Frog", 10.0, 30.0, 3.5, 8.0),
];

pub fn species(id: &str) -> Option<&'static SpeciesTemplate> {
    SPECIES.iter().find(|t| t.id == id)
}

impl SpeciesTemplate {
    /// Components for a fresh creature, health scaled by difficulty.
    pub fn bundle(&self, position: Vec3, health_multiplier: f32) -> (CreatureBundle, Option<EnemyEffect>) {
        let bundle = CreatureBundle {
            transform: Transform::at(position),
            movement: Movement::new(self.speed),
            species: Species::new(
                self.id,
                self.name,
                self.kind,
                self.max_health * health_multiplier,
                self.max_stamina,
                self.speed,
            ),
            combat: Combat {
                damage: self.damage,
                attack_range: self.attack_range,
                attack_speed: self.attack_speed,
                last_attack_time: None,
            },
            steering: Steering::with_awareness(self.awareness),
        };
        let effect = self.effect.map(|(kind, value)| EnemyEffect::new(kind, value));
        (bundle, effect)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnEntry {
    pub species: &'static str,
    pub weight: u32,
}

const fn entry(species: &'static str, weight: u32) -> SpawnEntry {
    SpawnEntry { species, weight }
}

/// Weighted predator and prey lists for one biome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnTable {
    pub predators: &'static [SpawnEntry],
    pub prey: &'static [SpawnEntry],
}

const MEADOW: SpawnTable = SpawnTable {
    predators: &[entry("wolf", 1)],
    prey: &[entry("deer", 3), entry("rabbit", 4)],
};
const FOREST: SpawnTable = SpawnTable {
    predators: &[entry("wolf", 3), entry("bear", 1)],
    prey: &[entry("deer", 4), entry("rabbit", 2)],
};
const DESERT: SpawnTable = SpawnTable {
    predators: &[entry("scorpion", 3), entry("wolf", 1)],
    prey: &[entry("lizard", 4), entry("goat", 1)],
};
const TUNDRA: SpawnTable = SpawnTable {
    predators: &[entry("snow_lynx", 2), entry("wolf", 2), entry("bear", 1)],
    prey: &[entry("goat", 3), entry("rabbit", 2)],
};
const SWAMP: SpawnTable = SpawnTable {
    predators: &[entry("swamp_leech", 3), entry("wolf", 1)],
    prey: &[entry("frog", 4), entry("deer", 1)],
};

impl SpawnTable {
    pub fn for_biome(kind: BiomeKind) -> Self {
        match kind {
            BiomeKind::Meadow => MEADOW,
            BiomeKind::Forest => FOREST,
            BiomeKind::Desert => DESERT,
            BiomeKind::Tundra => TUNDRA,
            BiomeKind::Swamp => SWAMP,
        }
    }

    /// Weighted draw from one side of the table. A failed draw (e.g. all
    /// weights zero) falls back to the first entry.
    pub fn draw(&self, predators: bool, rng: &mut SmallRng) -> Option<&'static SpeciesTemplate> {
        let entries = if predators { self.predators } else { self.prey };
        let picked = match WeightedIndex::new(entries.iter().map(|e| e.weight)) {
            Ok(dist) => entries.get(dist.sample(rng)),
            Err(_) => entries.first(),
        }?;
        species(picked.species)
    }
}

/// Restore amounts and respawn delay per resource kind.
pub fn resource_node(kind: ResourceKind) -> ResourceNode {
    let (health, stamina, respawn) = match kind {
        ResourceKind::Berries => (10.0, 5.0, 60.0),
        ResourceKind::Herb => (25.0, 0.0, 120.0),
        ResourceKind::Mushroom => (5.0, 15.0, 90.0),
        ResourceKind::Spring => (0.0, 40.0, 45.0),
    };
    ResourceNode::new(kind, health, stamina, respawn)
}

/// Resource kinds seeded around each biome's centre.
pub fn biome_resources(kind: BiomeKind) -> &'static [ResourceKind] {
    use ResourceKind::*;
    match kind {
        BiomeKind::Meadow => &[Berries, Herb, Spring],
        BiomeKind::Forest => &[Berries, Mushroom, Herb, Mushroom],
        BiomeKind::Desert => &[Spring, Herb],
        BiomeKind::Tundra => &[Berries, Spring],
        BiomeKind::Swamp => &[Mushroom, Herb, Mushroom],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_every_table_entry_resolves() {
        for kind in [
            BiomeKind::Meadow,
            BiomeKind::Forest,
            BiomeKind::Desert,
            BiomeKind::Tundra,
            BiomeKind::Swamp,
        ] {
            let table = SpawnTable::for_biome(kind);
            for e in table.predators {
                assert_eq!(species(e.species).map(|t| t.kind), Some(SpeciesKind::Predator));
            }
            for e in table.prey {
                assert_eq!(species(e.species).map(|t| t.kind), Some(SpeciesKind::Prey));
            }
        }
    }

    #[test]
    fn test_zero_weights_fall_back_to_first_entry() {
        static ZERO: [SpawnEntry; 2] = [entry("bear", 0), entry("wolf", 0)];
        let table = SpawnTable {
            predators: &ZERO,
            prey: &[],
        };
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(table.draw(true, &mut rng).map(|t| t.id), Some("bear"));
        assert!(table.draw(false, &mut rng).is_none());
    }

    #[test]
    fn test_bundle_scales_health() {
        let wolf = species("wolf").unwrap();
        let (bundle, effect) = wolf.bundle(Vec3::ZERO, 1.5);
        assert_eq!(bundle.species.max_health(), 75.0);
        assert!(effect.is_none());

        let (_, effect) = species("bear").unwrap().bundle(Vec3::ZERO, 1.0);
        assert_eq!(effect.map(|e| e.kind), Some(EnemyEffectKind::Rage));
    }
}
