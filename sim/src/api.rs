//! Public API for the simulation.
//!
//! `SimWorld` owns the entity store and the tick schedule and is the one
//! surface the input controller, presentation and stat collaborators talk
//! to.
//!
//! ## Tick Model
//!
//! `step(dt)` runs the whole schedule exactly once with the caller's frame
//! time. Only the behavioural AI is rate-decoupled: the agent registry
//! accumulates time and runs its 20 Hz steps, at most
//! `max_ai_steps_per_tick` of them per call.

use crate::bridge;
use crate::components::*;
use crate::config::SimConfig;
use crate::data;
use crate::environment::{Difficulty, Environment, TimeOfDay, WeatherKind, WorldEventKind};
use crate::notify::{Notice, Outbox, Progress};
use crate::registry::AgentRegistry;
use crate::spatial::SpatialGrid;
use crate::store::{EntityId, EntityStore};
use crate::systems::*;
use crate::world::Snapshot;
use bevy_ecs::prelude::*;
use glam::Vec3;
use std::f32::consts::TAU;
use tracing::{debug, info, warn};

/// The main simulation world container.
///
/// Holds the entity store and schedule, providing a clean API for:
/// - Initializing the simulation
/// - Stepping the simulation forward
/// - Extracting state snapshots
/// - Feeding in observer input and player actions
pub struct SimWorld {
    store: EntityStore,
    schedule: Schedule,
    player: EntityId,
}

impl SimWorld {
    /// Create a simulation with default tuning.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    /// Create a simulation with custom tuning.
    pub fn with_config(config: SimConfig) -> Self {
        let mut world = World::new();

        // Core resources
        world.insert_resource(DeltaTime(0.0));
        world.insert_resource(SimClock::default());
        world.insert_resource(SimRng::seeded(config.seed));
        world.insert_resource(Outbox::default());
        world.insert_resource(Progress::default());
        world.insert_resource(Environment::new(
            TimeOfDay::new(config.start_hour, config.time_scale),
            config.difficulty,
        ));
        world.insert_resource(AgentRegistry::new(config.ai_rate_hz, config.max_ai_steps_per_tick));
        world.insert_resource(SpatialGrid::new(config.grid_cell_size, config.world_half_extent));

        // Combat resources
        world.insert_resource(CombatClock::default());
        world.insert_resource(CombatTurn::default());
        world.insert_resource(PendingAttacks::default());
        world.insert_resource(DeferredEffects::default());
        world.insert_resource(config);

        let mut store = EntityStore::from_world(world);
        let player = store.add(PlayerBundle::new(Vec3::ZERO));
        seed_resources(&mut store);

        // One chain: the tick order is part of the behaviour.
        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                clock_system,
                environment_system,
                biome_system,
                death_cleanup_system,
                population_system,
                resource_respawn_system,
                resource_pickup_system,
                agent_registration_system,
                agent_update_system,
                attack_event_system,
                proximity_combat_system,
                deferred_effect_system,
                slow_debuff_system,
            )
                .chain(),
        );

        info!(player = player.0, "simulation initialized");
        Self { store, schedule, player }
    }

    /// Step the simulation forward by `dt` seconds.
    ///
    /// Non-finite or negative frame times are treated as zero.
    pub fn step(&mut self, dt: f32) {
        let dt = if dt.is_finite() && dt > 0.0 {
            dt
        } else {
            if dt != 0.0 {
                warn!(dt, "ignoring invalid frame time");
            }
            0.0
        };
        let world = self.store.world_mut();
        world.resource_mut::<DeltaTime>().0 = dt;
        self.schedule.run(world);
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    /// Authoritative observer position and velocity for the next tick.
    pub fn set_observer(&mut self, position: Vec3, velocity: Vec3) {
        if !position.is_finite() || !velocity.is_finite() {
            debug!("ignoring non-finite observer input");
            return;
        }
        if let Some(mut transform) = self.store.get_mut::<Transform>(self.player) {
            transform.position = position;
            if velocity.x != 0.0 || velocity.z != 0.0 {
                transform.rotation = velocity.x.atan2(velocity.z);
            }
        }
        if let Some(mut movement) = self.store.get_mut::<Movement>(self.player) {
            movement.velocity = velocity;
        }
    }

    /// Queue a player attack for the next tick.
    pub fn player_attack(&mut self, origin: Vec3, radius: f32, damage: f32) {
        self.store
            .world_mut()
            .resource_mut::<PendingAttacks>()
            .0
            .push(AttackEvent { origin, radius, damage });
    }

    /// Collect a resource node by id. Returns `false` if there is no such
    /// node, it is already collected, or the observer is dead.
    pub fn collect_resource(&mut self, id: EntityId) -> bool {
        let now = self.current_time();
        if !self.store.get::<Species>(self.player).is_some_and(Species::is_alive) {
            return false;
        }
        let Some(restore) = self
            .store
            .get_mut::<ResourceNode>(id)
            .and_then(|mut node| node.collect(now))
        else {
            return false;
        };
        if let Some(mut species) = self.store.get_mut::<Species>(self.player) {
            apply_restore(&mut species, restore);
        }
        let world = self.store.world_mut();
        world.resource_mut::<Progress>().resources_collected += 1;
        world.resource_mut::<Outbox>().push(Notice::ResourceCollected {
            id,
            health: restore.health,
            stamina: restore.stamina,
        });
        true
    }

    // ------------------------------------------------------------------------
    // World controls
    // ------------------------------------------------------------------------

    /// Change the difficulty tier. A lower ceiling is reached by culling
    /// one creature per tick.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        let mut env = self.store.world_mut().resource_mut::<Environment>();
        if env.difficulty != difficulty {
            info!(from = ?env.difficulty, to = ?difficulty, "difficulty changed");
            env.difficulty = difficulty;
        }
    }

    pub fn set_hour(&mut self, hour: f32) {
        self.store.world_mut().resource_mut::<Environment>().time.set_hour(hour);
    }

    /// Begin a weather transition. Ignored while another one is running.
    pub fn force_weather(&mut self, kind: WeatherKind) -> bool {
        self.store
            .world_mut()
            .resource_mut::<Environment>()
            .weather
            .begin_transition(kind)
    }

    /// Start a world event now, if the day phase allows it.
    pub fn trigger_world_event(&mut self, kind: WorldEventKind) -> bool {
        let now = self.current_time();
        let world = self.store.world_mut();
        let started = {
            let mut env = world.resource_mut::<Environment>();
            let phase = env.time.phase;
            env.events.try_start(kind, now, phase)
        };
        if !started {
            return false;
        }
        info!(event = ?kind, "world event triggered");
        world.resource_mut::<Outbox>().push(Notice::WorldEventStarted { event: kind });
        true
    }

    /// Spawn a creature from the species table. The agent is registered on
    /// the next tick.
    pub fn spawn_species(&mut self, species: &str, position: Vec3) -> Option<EntityId> {
        let template = data::species(species)?;
        let health = self.environment().difficulty.multipliers().health;
        let (bundle, effect) = template.bundle(position, health);
        let id = self.store.add(bundle);
        if let (Some(effect), Some(entity)) = (effect, self.store.entity(id)) {
            self.store.world_mut().entity_mut(entity).insert(effect);
        }
        debug!(id = id.0, species, "spawned on request");
        Some(id)
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        id != self.player && self.store.remove(id)
    }

    // ------------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------------

    pub fn snapshot(&mut self) -> Snapshot {
        let tick = self.current_tick();
        let time = self.current_time();
        Snapshot::from_world(self.store.world_mut(), tick, time)
    }

    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// Fixed-stride agent buffer; see `bridge`.
    pub fn render_buffer(&mut self) -> Vec<f32> {
        bridge::snapshot_to_buffer(&self.snapshot())
    }

    /// Take every notice emitted since the last drain.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.store.world_mut().resource_mut::<Outbox>().drain()
    }

    pub fn environment(&self) -> &Environment {
        self.store.world().resource::<Environment>()
    }

    pub fn progress(&self) -> &Progress {
        self.store.world().resource::<Progress>()
    }

    pub fn combat_turn(&self) -> CombatTurn {
        *self.store.world().resource::<CombatTurn>()
    }

    pub fn config(&self) -> &SimConfig {
        self.store.world().resource::<SimConfig>()
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    /// Number of living creatures, the observer excluded.
    pub fn population(&mut self) -> usize {
        let world = self.store.world_mut();
        let mut query = world.query_filtered::<&Species, Without<Player>>();
        query.iter(world).filter(|s| s.is_alive()).count()
    }

    /// Observer speed multiplier from weather and any active slow.
    pub fn player_speed_multiplier(&self) -> f32 {
        let slow = self
            .store
            .get::<SlowDebuff>(self.player)
            .map(|s| s.factor)
            .unwrap_or(1.0);
        self.environment().movement_multiplier() * slow
    }

    pub fn current_tick(&self) -> u64 {
        self.store.world().resource::<SimClock>().tick
    }

    pub fn current_time(&self) -> f32 {
        self.store.world().resource::<SimClock>().elapsed
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Resource nodes in a ring around each biome centre.
fn seed_resources(store: &mut EntityStore) {
    let zones = store.world().resource::<Environment>().biome.zones().to_vec();
    for zone in zones {
        let kinds = data::biome_resources(zone.kind);
        let ring = (zone.radius * 0.4).max(6.0);
        for (i, kind) in kinds.iter().enumerate() {
            let angle = i as f32 / kinds.len() as f32 * TAU;
            let position = Vec3::new(
                zone.center.0 + ring * angle.sin(),
                0.0,
                zone.center.1 + ring * angle.cos(),
            );
            store.add(ResourceBundle {
                transform: Transform::at(position),
                node: data::resource_node(*kind),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_world() {
        let mut sim = SimWorld::new();
        assert_eq!(sim.current_tick(), 0);
        assert_eq!(sim.population(), 0);
        assert!(sim.store().contains(sim.player()));
        assert!(!sim.snapshot().resources.is_empty());
    }

    #[test]
    fn test_step_advances_tick() {
        let mut sim = SimWorld::new();
        sim.step(0.05);
        assert_eq!(sim.current_tick(), 1);
        sim.step(0.05);
        assert_eq!(sim.current_tick(), 2);
        assert!((sim.current_time() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_frame_time_is_zero() {
        let mut sim = SimWorld::new();
        sim.step(f32::NAN);
        sim.step(-1.0);
        assert_eq!(sim.current_tick(), 2);
        assert_eq!(sim.current_time(), 0.0);
    }

    #[test]
    fn test_population_fills_to_ceiling() {
        let mut sim = SimWorld::new();
        for _ in 0..200 {
            sim.step(0.05);
        }
        let ceiling = sim.config().spawner.population_ceiling(1.0);
        assert!(sim.population() > 0);
        assert!(sim.population() <= ceiling);
    }

    #[test]
    fn test_observer_is_authoritative() {
        let mut sim = SimWorld::new();
        let target = Vec3::new(12.0, 0.0, -4.0);
        sim.set_observer(target, Vec3::new(1.0, 0.0, 0.0));
        for _ in 0..10 {
            sim.step(0.05);
        }
        let snapshot = sim.snapshot();
        let player = snapshot.agent(sim.player()).unwrap();
        assert_eq!((player.x, player.z), (12.0, -4.0));
    }

    #[test]
    fn test_collect_resource_is_idempotent() {
        let mut sim = SimWorld::new();
        let node = sim.snapshot().resources[0].id;
        assert!(sim.collect_resource(node));
        assert!(!sim.collect_resource(node));
        assert!(!sim.collect_resource(sim.player()), "not a resource");
        assert_eq!(sim.progress().resources_collected, 1);
        assert!(sim
            .drain_notices()
            .iter()
            .any(|n| matches!(n, Notice::ResourceCollected { id, .. } if *id == node)));
    }

    #[test]
    fn test_player_attack_kills_and_rewards() {
        let mut sim = SimWorld::new();
        let rabbit = sim.spawn_species("rabbit", Vec3::new(2.0, 0.0, 0.0)).unwrap();
        sim.player_attack(Vec3::ZERO, 4.0, 100.0);
        sim.step(0.05);
        sim.step(0.05);

        assert!(!sim.store().contains(rabbit));
        assert_eq!(sim.progress().kills, 1);
        let notices = sim.drain_notices();
        assert!(notices
            .iter()
            .any(|n| matches!(n, Notice::EntityDied { id, .. } if *id == rabbit)));
        let xp_awards = notices
            .iter()
            .filter(|n| matches!(n, Notice::ExperienceAwarded { .. }))
            .count();
        assert_eq!(xp_awards, 1);
    }

    #[test]
    fn test_world_event_respects_phase() {
        let mut sim = SimWorld::new();
        sim.set_hour(12.0);
        assert!(!sim.trigger_world_event(WorldEventKind::BloodMoon));
        sim.set_hour(23.0);
        assert!(sim.trigger_world_event(WorldEventKind::BloodMoon));
        assert_eq!(sim.snapshot().events, vec![WorldEventKind::BloodMoon]);
    }

    #[test]
    fn test_despawn_keeps_player() {
        let mut sim = SimWorld::new();
        let wolf = sim.spawn_species("wolf", Vec3::new(50.0, 0.0, 0.0)).unwrap();
        assert!(!sim.despawn(sim.player()));
        assert!(sim.despawn(wolf));
        assert!(!sim.despawn(wolf));
        assert!(sim.spawn_species("dragon", Vec3::ZERO).is_none());
    }
}
