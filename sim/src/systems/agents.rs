//! Agent systems: registration and the three-phase sync.
//!
//! Every tick, in this order:
//! 1. the observer's authoritative transform is copied into its agent;
//! 2. state machines and steering physics advance for every autonomous
//!    agent, at the registry's fixed cadence;
//! 3. agent position, velocity and facing are written back to the
//!    entity's `Transform` and `Movement`.
//!
//! The observer's agent is never written back; its entity always wins.

use crate::behavior::{Body, Percept, StepContext, Strike};
use crate::components::*;
use crate::environment::Environment;
use crate::notify::{Notice, Outbox};
use crate::registry::AgentRegistry;
use crate::spatial::SpatialGrid;
use crate::steering::integrate;
use crate::store::EntityId;
use crate::systems::clock::{DeltaTime, SimRng};
use bevy_ecs::prelude::*;
use glam::Vec3;
use std::collections::HashMap;
use tracing::debug;

/// Stamina burned per second in Flee and Chase.
pub const STAMINA_DRAIN: f32 = 6.0;
/// Stamina recovered per second in every other state.
pub const STAMINA_REGEN: f32 = 4.0;

type ObserverItem = (
    &'static EntityId,
    &'static Transform,
    &'static Movement,
    &'static Species,
);

type CreatureItem = (
    &'static EntityId,
    &'static mut Transform,
    &'static mut Movement,
    &'static mut Species,
    &'static Combat,
    &'static mut Steering,
    Option<&'static mut EnemyEffect>,
);

/// Drops agents whose entity is gone and registers new entities.
///
/// Runs every tick; registration is cheap compared to a behavioural step.
pub fn agent_registration_system(
    mut registry: ResMut<AgentRegistry>,
    mut rng: ResMut<SimRng>,
    ids: Query<&EntityId>,
    observers: Query<(Entity, &EntityId, &Transform, &Movement), With<Player>>,
    creatures: Query<(Entity, &EntityId, &Transform, &Movement, &Species), (With<Steering>, Without<Player>)>,
) {
    // Bevy recycles entity handles, so the id must match as well.
    let dropped = registry.retain(|id, agent| ids.get(agent.entity).is_ok_and(|live| live == id));
    if dropped > 0 {
        debug!(dropped, "pruned dangling agents");
    }

    for (entity, id, transform, movement) in observers.iter() {
        if !registry.contains(*id) {
            registry.register_observer(*id, entity, transform, movement);
        }
    }

    for (entity, id, transform, movement, species) in creatures.iter() {
        if species.is_alive() && !registry.contains(*id) {
            registry.register_autonomous(*id, entity, transform, movement, &mut rng.0);
            debug!(id = id.0, species = %species.id, "agent registered");
        }
    }
}

/// The sync protocol plus rate-limited behaviour and steering.
///
/// ## Data Access
/// - Reads: DeltaTime, Environment, observer components
/// - Writes: AgentRegistry, SpatialGrid, SimRng, Outbox, creature components
#[allow(clippy::too_many_arguments)]
pub fn agent_update_system(
    dt: Res<DeltaTime>,
    env: Res<Environment>,
    mut registry: ResMut<AgentRegistry>,
    mut grid: ResMut<SpatialGrid>,
    mut rng: ResMut<SimRng>,
    mut outbox: ResMut<Outbox>,
    observers: Query<ObserverItem, With<Player>>,
    mut creatures: Query<CreatureItem, Without<Player>>,
) {
    // 1. Observer in.
    for (id, transform, movement, _) in observers.iter() {
        if let Some(agent) = registry.get_mut(*id) {
            agent.vehicle.position = transform.position;
            agent.vehicle.velocity = movement.velocity;
            agent.vehicle.heading = transform.rotation;
        }
    }

    // 2. Behaviour and physics.
    let steps = registry.accumulate(dt.0);
    let interval = registry.interval();
    let awareness_scale = env.awareness_scale();
    let weather_speed = env.movement_multiplier();
    let damage_scale = env.enemy_damage_multiplier();

    for _ in 0..steps {
        let bodies = collect_bodies(&registry, &observers, &creatures);
        grid.clear();
        for (id, body) in &bodies {
            if body.alive {
                grid.insert(*id, body.position.x, body.position.z, body.kind);
            }
        }
        let ctx = StepContext {
            dt: interval,
            grid: &grid,
            bodies: &bodies,
        };

        let mut strikes: Vec<(Strike, f32)> = Vec::new();
        let mut stamina: Vec<(Entity, bool)> = Vec::new();

        for id in registry.autonomous_ids() {
            let Some(agent) = registry.get_mut(id) else {
                continue;
            };
            let Ok((_, _, _, species, combat, steering, effect)) = creatures.get(agent.entity) else {
                continue;
            };
            if !species.is_alive() {
                if let Some(machine) = agent.machine.as_mut() {
                    machine.halt(&mut agent.steering);
                }
                agent.vehicle.velocity = Vec3::ZERO;
                agent.last_force = Vec3::ZERO;
                continue;
            }

            let percept = Percept {
                id,
                kind: species.kind,
                position: agent.vehicle.position,
                awareness: steering.awareness_radius * awareness_scale,
                attack_range: combat.attack_range,
            };
            let exhausted = species.is_exhausted();
            let damage = combat.damage * damage_scale * effect_damage_multiplier(effect);

            let Some(machine) = agent.machine.as_mut() else {
                continue;
            };
            if let Some(strike) = machine.execute(&percept, &mut agent.steering, &ctx, &mut rng.0) {
                strikes.push((strike, damage));
            }
            let state = machine.state();

            let neighbors: Vec<Vec3> = if agent.steering.separation {
                let position = agent.vehicle.position;
                ctx.grid
                    .query_radius(position.x, position.z, agent.steering.separation_radius)
                    .into_iter()
                    .filter(|entry| entry.id != id)
                    .map(|entry| Vec3::new(entry.x, 0.0, entry.z))
                    .collect()
            } else {
                Vec::new()
            };
            let force = agent.steering.calculate(&agent.vehicle, &neighbors, &mut rng.0, interval);

            // Exhausted agents lose their sprint bonus but keep the Attack slow-down.
            let mut multiplier = state.speed_multiplier();
            if exhausted {
                multiplier = multiplier.min(1.0);
            }
            let cap = agent.vehicle.max_speed * multiplier * weather_speed;
            integrate(&mut agent.vehicle, force, interval, cap);
            agent.last_force = force;
            stamina.push((agent.entity, state.drains_stamina()));
        }

        for (entity, drains) in stamina {
            if let Ok((_, _, _, mut species, ..)) = creatures.get_mut(entity) {
                if drains {
                    species.drain_stamina(STAMINA_DRAIN * interval);
                } else {
                    species.restore_stamina(STAMINA_REGEN * interval);
                }
            }
        }

        for (strike, damage) in strikes {
            let Some(entity) = registry.get(strike.target).map(|agent| agent.entity) else {
                continue;
            };
            if let Ok((_, _, _, mut species, ..)) = creatures.get_mut(entity) {
                if species.apply_damage(damage) {
                    debug!(attacker = strike.attacker.0, target = strike.target.0, "creature killed");
                }
            }
        }
    }

    // 3. Agents out.
    for (id, mut transform, mut movement, mut species, _, mut steering, effect) in creatures.iter_mut() {
        let Some(agent) = registry.get(*id) else {
            continue;
        };
        let Some(machine) = agent.machine.as_ref() else {
            continue;
        };
        transform.position = agent.vehicle.position;
        transform.rotation = agent.vehicle.heading;
        movement.velocity = agent.vehicle.velocity;
        movement.acceleration = agent.last_force / agent.vehicle.mass.max(f32::EPSILON);

        if species.is_alive() {
            let from = species.state();
            let to = machine.state().species_state();
            if from != to && species.set_state(to) {
                outbox.push(Notice::StateChanged { id: *id, from, to });
            }
        }
        steering.target = machine.focus();
        steering.wander_heading = agent.steering.wander.angle;
        steering.wander_timer = machine.remaining();

        if let Some(mut effect) = effect {
            if effect.kind == EnemyEffectKind::Rage {
                effect.active = species.is_alive() && species.health_fraction() < 0.5;
            }
        }
    }
}

/// Everyone the behaviour layer can see, at agent positions where known.
fn collect_bodies(
    registry: &AgentRegistry,
    observers: &Query<ObserverItem, With<Player>>,
    creatures: &Query<CreatureItem, Without<Player>>,
) -> HashMap<EntityId, Body> {
    let position_of = |id: EntityId, fallback: Vec3| {
        registry
            .get(id)
            .map(|agent| agent.vehicle.position)
            .unwrap_or(fallback)
    };

    let mut bodies = HashMap::new();
    for (id, transform, _, species) in observers.iter() {
        bodies.insert(
            *id,
            Body {
                position: position_of(*id, transform.position),
                kind: species.kind,
                alive: species.is_alive(),
            },
        );
    }
    for (id, transform, _, species, ..) in creatures.iter() {
        bodies.insert(
            *id,
            Body {
                position: position_of(*id, transform.position),
                kind: species.kind,
                alive: species.is_alive(),
            },
        );
    }
    bodies
}
