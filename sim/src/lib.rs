//! Untamed - Simulation Core
//!
//! A real-time wilderness simulation: an entity store, steering-driven agents
//! with per-agent behaviour state machines, a spatial index for neighbour
//! queries, and an environmental layer (time of day, weather, biomes, world
//! events, difficulty) that parameterizes agents and combat.
//! Uses `bevy_ecs` for the entity-component-system architecture.

pub mod api;
pub mod behavior;
pub mod bridge;
pub mod components;
pub mod config;
pub mod data;
pub mod environment;
pub mod notify;
pub mod registry;
pub mod spatial;
pub mod steering;
pub mod store;
pub mod systems;
pub mod world;

pub use api::SimWorld;
pub use behavior::{BehaviorState, StateMachine};
pub use components::*;
pub use config::{ConfigError, SimConfig, SpawnerConfig};
pub use environment::Environment;
pub use notify::{Notice, Outbox, Progress};
pub use registry::{Agent, AgentRegistry};
pub use spatial::{SpatialEntry, SpatialGrid};
pub use steering::{SteeringSet, Vehicle};
pub use store::{EntityId, EntityIndex, EntityStore};
pub use systems::*;
pub use world::{AgentSnapshot, ResourceSnapshot, Snapshot};
