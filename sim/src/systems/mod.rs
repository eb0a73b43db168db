//! ECS Systems for the Untamed simulation.
//!
//! Systems contain the game logic that operates on components.
//!
//! ## Tick Order
//!
//! Every tick runs one chained schedule, in this order:
//!
//! **Clock and environment** - advance shared state first:
//! - `clock_system` - Advances tick counter and simulation time
//! - `environment_system` - Time of day, weather, world events
//! - `biome_system` - Resolves the biome under the observer
//!
//! **Population** - spawn and despawn before agents see the world:
//! - `death_cleanup_system` - Rewards, split offspring, despawn of the dead
//! - `population_system` - Spawns or culls toward the population ceiling
//! - `resource_respawn_system` / `resource_pickup_system`
//!
//! **Agents** - fixed-rate AI decoupled from the frame rate:
//! - `agent_registration_system` - Keeps the registry in step with the store
//! - `agent_update_system` - Sync in, 20 Hz AI steps, sync out
//!
//! **Combat** - reads the freshly synced positions and states:
//! - `attack_event_system` - Queued attack events from the observer
//! - `proximity_combat_system` - Contact damage from attacking predators
//! - `deferred_effect_system` - Counter-attacks, re-validated on fire
//! - `slow_debuff_system` - Expires slows

pub mod agents;
pub mod clock;
pub mod combat;
pub mod environment;
pub mod resources;
pub mod spawner;

pub use agents::*;
pub use clock::*;
pub use combat::*;
pub use environment::{biome_system, environment_system};
pub use resources::*;
pub use spawner::*;
