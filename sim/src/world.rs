//! Snapshot types.
//!
//! The `Snapshot` struct provides a serializable, read-only view of the
//! simulation for presentation and persistence collaborators.

use crate::components::*;
use crate::environment::{
    BiomeKind, Difficulty, Environment, Lighting, TimeOfDay, WeatherState, WorldEventKind,
};
use crate::notify::Progress;
use crate::store::EntityId;
use crate::systems::combat::CombatTurn;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// One creature or the observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: EntityId,
    pub species: String,
    pub kind: SpeciesKind,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
    /// Yaw in radians.
    pub heading: f32,
    pub health: f32,
    pub health_max: f32,
    pub stamina: f32,
    pub stamina_max: f32,
    pub state: SpeciesState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub id: EntityId,
    pub kind: ResourceKind,
    pub x: f32,
    pub z: f32,
    pub collected: bool,
}

/// Complete simulation state snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f32,
    /// Species-bearing entities, ordered by id.
    pub agents: Vec<AgentSnapshot>,
    pub resources: Vec<ResourceSnapshot>,
    pub time_of_day: TimeOfDay,
    pub lighting: Lighting,
    pub weather: WeatherState,
    pub biome: BiomeKind,
    pub events: Vec<WorldEventKind>,
    pub difficulty: Difficulty,
    pub combat: CombatTurn,
    /// Active slow on the observer, if any.
    pub player_slow: Option<SlowDebuff>,
    pub progress: Progress,
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &mut World, tick: u64, time: f32) -> Self {
        let mut agents = Vec::new();
        let mut query = world.query::<(&EntityId, &Species, &Transform, Option<&Movement>)>();
        for (id, species, transform, movement) in query.iter(world) {
            let velocity = movement.map(|m| m.velocity).unwrap_or_default();
            agents.push(AgentSnapshot {
                id: *id,
                species: species.id.clone(),
                kind: species.kind,
                x: transform.position.x,
                y: transform.position.y,
                z: transform.position.z,
                vx: velocity.x,
                vy: velocity.y,
                vz: velocity.z,
                heading: transform.rotation,
                health: species.health(),
                health_max: species.max_health(),
                stamina: species.stamina(),
                stamina_max: species.max_stamina(),
                state: species.state(),
            });
        }
        agents.sort_by_key(|a| a.id);

        let mut resources = Vec::new();
        let mut node_query = world.query::<(&EntityId, &Transform, &ResourceNode)>();
        for (id, transform, node) in node_query.iter(world) {
            resources.push(ResourceSnapshot {
                id: *id,
                kind: node.kind,
                x: transform.position.x,
                z: transform.position.z,
                collected: node.collected,
            });
        }
        resources.sort_by_key(|r| r.id);

        let mut slow_query = world.query_filtered::<&SlowDebuff, With<Player>>();
        let player_slow = slow_query.iter(world).next().copied();

        let env = world.get_resource::<Environment>().cloned().unwrap_or_default();
        let combat = world.get_resource::<CombatTurn>().copied().unwrap_or_default();
        let progress = world.get_resource::<Progress>().cloned().unwrap_or_default();

        Self {
            tick,
            time,
            agents,
            resources,
            time_of_day: env.time,
            lighting: env.lighting(),
            weather: env.weather,
            biome: env.biome.kind(),
            events: env.active_events(),
            difficulty: env.difficulty,
            combat,
            player_slow,
            progress,
        }
    }

    pub fn agent(&self, id: EntityId) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
