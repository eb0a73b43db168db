//! Biome zoning by nearest zone centre.

use crate::data::SpawnTable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiomeKind {
    Meadow,
    Forest,
    Desert,
    Tundra,
    Swamp,
}

/// A region of the world. `radius` biases the layout but does not bound
/// membership; every point belongs to its nearest centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiomeZone {
    pub center: (f32, f32),
    pub radius: f32,
    pub kind: BiomeKind,
    pub spawn_table: SpawnTable,
}

impl BiomeZone {
    fn distance_sq(&self, x: f32, z: f32) -> f32 {
        (self.center.0 - x).powi(2) + (self.center.1 - z).powi(2)
    }
}

/// The standard world: a small home meadow at the origin ringed by the
/// wilder biomes.
pub fn default_zones() -> Vec<BiomeZone> {
    let zone = |center, radius, kind| BiomeZone {
        center,
        radius,
        kind,
        spawn_table: SpawnTable::for_biome(kind),
    };
    vec![
        zone((0.0, 0.0), 25.0, BiomeKind::Meadow),
        zone((160.0, 40.0), 90.0, BiomeKind::Forest),
        zone((-170.0, -60.0), 100.0, BiomeKind::Desert),
        zone((20.0, 210.0), 90.0, BiomeKind::Tundra),
        zone((60.0, -190.0), 80.0, BiomeKind::Swamp),
    ]
}

#[derive(Debug, Clone)]
pub struct BiomeState {
    zones: Vec<BiomeZone>,
    current: usize,
    /// Reset to 0 on every biome change and ramps to 1 over a few seconds.
    pub transition_progress: f32,
}

impl Default for BiomeState {
    fn default() -> Self {
        Self::new(default_zones())
    }
}

impl BiomeState {
    /// An empty layout falls back to the default zones so that exactly one
    /// biome is always current.
    pub fn new(zones: Vec<BiomeZone>) -> Self {
        let zones = if zones.is_empty() { default_zones() } else { zones };
        Self {
            zones,
            current: 0,
            transition_progress: 1.0,
        }
    }

    pub fn zones(&self) -> &[BiomeZone] {
        &self.zones
    }

    pub fn current(&self) -> &BiomeZone {
        &self.zones[self.current]
    }

    pub fn kind(&self) -> BiomeKind {
        self.current().kind
    }

    /// Index of the zone whose centre is nearest to `(x, z)`. Ties go to
    /// the earlier zone. Non-finite input resolves to the first zone.
    pub fn resolve(&self, x: f32, z: f32) -> usize {
        if !x.is_finite() || !z.is_finite() {
            return 0;
        }
        let mut best = 0;
        let mut best_distance = f32::INFINITY;
        for (index, zone) in self.zones.iter().enumerate() {
            let distance = zone.distance_sq(x, z);
            if distance < best_distance {
                best = index;
                best_distance = distance;
            }
        }
        best
    }

    /// Re-resolve for the observer position. Returns `(from, to)` on change.
    pub fn update(&mut self, x: f32, z: f32, dt: f32) -> Option<(BiomeKind, BiomeKind)> {
        let resolved = self.resolve(x, z);
        if resolved != self.current {
            let from = self.kind();
            self.current = resolved;
            self.transition_progress = 0.0;
            return Some((from, self.kind()));
        }
        if dt.is_finite() && dt > 0.0 {
            self.transition_progress = (self.transition_progress + dt / 5.0).min(1.0);
        }
        None
    }
}
