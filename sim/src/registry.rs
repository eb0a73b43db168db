//! Agent registry: the physics-side mirror of store entities.
//!
//! Agents live in their own map keyed by `EntityId`, apart from the ECS
//! components they mirror. The sync protocol in `systems::agents` is the
//! only place the two sides exchange state.

use crate::behavior::StateMachine;
use crate::components::{Movement, Transform};
use crate::steering::{SteeringSet, Vehicle};
use crate::store::EntityId;
use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::rngs::SmallRng;
use std::collections::BTreeMap;
use tracing::warn;

/// Physically simulated counterpart of one entity.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Weak back-reference to the source entity.
    pub id: EntityId,
    pub entity: Entity,
    pub vehicle: Vehicle,
    /// `None` for the externally controlled observer.
    pub machine: Option<StateMachine>,
    pub steering: SteeringSet,
    /// Force applied during the last behavioural step.
    pub last_force: Vec3,
}

impl Agent {
    pub fn is_autonomous(&self) -> bool {
        self.machine.is_some()
    }
}

#[derive(Resource, Debug)]
pub struct AgentRegistry {
    agents: BTreeMap<EntityId, Agent>,
    accumulator: f32,
    interval: f32,
    max_steps: u32,
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new(20.0, 4)
    }
}

impl AgentRegistry {
    /// `rate_hz` behavioural updates per second, at most `max_steps` of them
    /// in a single tick.
    pub fn new(rate_hz: f32, max_steps: u32) -> Self {
        let rate = if rate_hz.is_finite() && rate_hz > 0.0 { rate_hz } else { 20.0 };
        Self {
            agents: BTreeMap::new(),
            accumulator: 0.0,
            interval: 1.0 / rate,
            max_steps: max_steps.max(1),
        }
    }

    /// Seconds per behavioural update.
    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Register the observer. Idempotent.
    pub fn register_observer(
        &mut self,
        id: EntityId,
        entity: Entity,
        transform: &Transform,
        movement: &Movement,
    ) -> &mut Agent {
        self.agents
            .entry(id)
            .or_insert_with(|| Agent {
                id,
                entity,
                vehicle: vehicle_for(transform, movement),
                machine: None,
                steering: SteeringSet::default(),
                last_force: Vec3::ZERO,
            })
    }

    /// Register an autonomous agent with a fresh state machine. Idempotent.
    pub fn register_autonomous(
        &mut self,
        id: EntityId,
        entity: Entity,
        transform: &Transform,
        movement: &Movement,
        rng: &mut SmallRng,
    ) -> &mut Agent {
        self.agents.entry(id).or_insert_with(|| {
            let mut steering = SteeringSet::default();
            let machine = StateMachine::new(&mut steering, rng);
            Agent {
                id,
                entity,
                vehicle: vehicle_for(transform, movement),
                machine: Some(machine),
                steering,
                last_force: Vec3::ZERO,
            }
        })
    }

    pub fn unregister(&mut self, id: EntityId) -> Option<Agent> {
        self.agents.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.agents.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agents in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Agent)> {
        self.agents.iter()
    }

    /// Ids of agents driven by a state machine, in id order.
    pub fn autonomous_ids(&self) -> Vec<EntityId> {
        self.agents
            .iter()
            .filter(|(_, agent)| agent.is_autonomous())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Keep only agents for which `keep` holds. Returns how many were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(&EntityId, &mut Agent) -> bool) -> usize {
        let before = self.agents.len();
        self.agents.retain(|id, agent| keep(id, agent));
        before - self.agents.len()
    }

    pub fn clear(&mut self) {
        self.agents.clear();
        self.accumulator = 0.0;
    }

    /// Feed elapsed time and return how many behavioural updates to run now.
    ///
    /// Catch-up is bounded by `max_steps`; whole intervals beyond that are
    /// dropped so a stall cannot snowball into longer and longer ticks.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }
        self.accumulator += dt;
        let mut steps = 0;
        while self.accumulator >= self.interval && steps < self.max_steps {
            self.accumulator -= self.interval;
            steps += 1;
        }
        if self.accumulator >= self.interval {
            let dropped = (self.accumulator / self.interval).floor();
            warn!(dropped_steps = dropped, "AI catch-up capped, dropping backlog");
            self.accumulator %= self.interval;
        }
        steps
    }
}

fn vehicle_for(transform: &Transform, movement: &Movement) -> Vehicle {
    let mut vehicle = Vehicle::new(transform.position, movement.max_speed);
    vehicle.velocity = movement.velocity;
    vehicle.heading = transform.rotation;
    vehicle.turn_rate = movement.turn_rate;
    vehicle
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn entity(world: &mut World) -> Entity {
        world.spawn_empty().id()
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut world = World::new();
        let e = entity(&mut world);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut registry = AgentRegistry::default();

        let transform = Transform::at(Vec3::new(1.0, 0.0, 2.0));
        registry.register_autonomous(EntityId(1), e, &transform, &Movement::new(5.0), &mut rng);
        registry.get_mut(EntityId(1)).unwrap().vehicle.position = Vec3::new(9.0, 0.0, 9.0);

        let again = registry.register_autonomous(EntityId(1), e, &Transform::default(), &Movement::new(1.0), &mut rng);
        assert_eq!(again.vehicle.position, Vec3::new(9.0, 0.0, 9.0));
        assert_eq!(again.vehicle.max_speed, 5.0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_observer_has_no_machine() {
        let mut world = World::new();
        let e = entity(&mut world);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut registry = AgentRegistry::default();
        registry.register_observer(EntityId(1), e, &Transform::default(), &Movement::default());
        registry.register_autonomous(EntityId(2), e, &Transform::default(), &Movement::default(), &mut rng);

        assert!(!registry.get(EntityId(1)).unwrap().is_autonomous());
        assert_eq!(registry.autonomous_ids(), vec![EntityId(2)]);
    }

    #[test]
    fn test_accumulator_runs_whole_steps() {
        let mut registry = AgentRegistry::new(20.0, 4);
        assert_eq!(registry.accumulate(0.03), 0);
        assert_eq!(registry.accumulate(0.03), 1);
        assert_eq!(registry.accumulate(0.1), 2);
        assert_eq!(registry.accumulate(f32::NAN), 0);
        assert_eq!(registry.accumulate(-1.0), 0);
    }

    #[test]
    fn test_accumulator_caps_catch_up() {
        let mut registry = AgentRegistry::new(20.0, 4);
        assert_eq!(registry.accumulate(10.0), 4);
        // The backlog was dropped rather than carried over.
        assert!(registry.accumulate(0.01) <= 1);
    }

    #[test]
    fn test_retain_and_unregister() {
        let mut world = World::new();
        let e = entity(&mut world);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut registry = AgentRegistry::default();
        for i in 1..=4 {
            registry.register_autonomous(EntityId(i), e, &Transform::default(), &Movement::default(), &mut rng);
        }
        assert_eq!(registry.retain(|id, _| id.0 % 2 == 0), 2);
        assert!(registry.unregister(EntityId(2)).is_some());
        assert!(registry.unregister(EntityId(2)).is_none());
        assert_eq!(registry.len(), 1);
    }
}
