//! Population control: death cleanup, culling and top-up spawns.

use crate::components::*;
use crate::config::SimConfig;
use crate::data;
use crate::environment::{DayPhase, Environment};
use crate::notify::{Notice, Outbox, Progress};
use crate::registry::AgentRegistry;
use crate::spatial::SpatialGrid;
use crate::store::{despawn_tracked, spawn_tracked, EntityId, EntityIndex};
use crate::systems::clock::SimRng;
use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;
use tracing::debug;

/// Offspring of a split start with this share of the parent's health.
const OFFSPRING_HEALTH: f32 = 0.5;

/// Removes dead creatures, pays out unclaimed experience and splits
/// creatures that carry the Split effect.
#[allow(clippy::too_many_arguments)]
pub fn death_cleanup_system(
    mut commands: Commands,
    mut index: ResMut<EntityIndex>,
    mut registry: ResMut<AgentRegistry>,
    mut rng: ResMut<SimRng>,
    mut outbox: ResMut<Outbox>,
    mut progress: ResMut<Progress>,
    config: Res<SimConfig>,
    env: Res<Environment>,
    observer: Query<&Transform, With<Player>>,
    npcs: Query<(&EntityId, &Transform, &Species, Option<&EnemyEffect>, Has<RewardClaimed>), Without<Player>>,
) {
    let observer_position = observer.get_single().ok().map(|t| t.position);
    let ceiling = config
        .spawner
        .population_ceiling(env.difficulty.multipliers().spawn_rate);
    let mut population = npcs.iter().filter(|(_, _, species, ..)| species.is_alive()).count();

    for (id, transform, species, effect, claimed) in npcs.iter() {
        if species.is_alive() || !index.contains(*id) {
            continue;
        }

        let in_range = observer_position.is_some_and(|p| {
            transform.planar_distance_sq(p) <= config.spawner.xp_radius * config.spawner.xp_radius
        });
        if !claimed && in_range {
            let amount = config.spawner.base_experience(species.kind) * env.experience_multiplier();
            progress.experience += amount;
            outbox.push(Notice::ExperienceAwarded { amount, source: *id });
        }
        outbox.push(Notice::EntityDied {
            id: *id,
            species: species.id.clone(),
            kind: species.kind,
        });

        if let Some(effect) = effect.filter(|e| e.kind == EnemyEffectKind::Split && e.active) {
            let wanted = effect.value.max(0.0).floor() as usize;
            let room = ceiling.saturating_sub(population);
            if let Some(template) = data::species(&species.id) {
                let health = env.difficulty.multipliers().health * OFFSPRING_HEALTH;
                for _ in 0..wanted.min(room) {
                    let offset = Vec3::new(rng.0.gen_range(-1.5..1.5), 0.0, rng.0.gen_range(-1.5..1.5));
                    // Offspring never split again.
                    let (bundle, _) = template.bundle(transform.position + offset, health);
                    spawn_tracked(&mut commands, &mut index, bundle);
                    population += 1;
                }
                debug!(parent = id.0, offspring = wanted.min(room), "creature split");
            }
        }

        registry.unregister(*id);
        despawn_tracked(&mut commands, &mut index, *id);
        debug!(id = id.0, species = %species.id, "creature removed");
    }
}

/// Keeps the living population at the ceiling: culls the farthest creature
/// when over, spawns one new creature when under.
#[allow(clippy::too_many_arguments)]
pub fn population_system(
    mut commands: Commands,
    mut index: ResMut<EntityIndex>,
    mut registry: ResMut<AgentRegistry>,
    mut rng: ResMut<SimRng>,
    config: Res<SimConfig>,
    env: Res<Environment>,
    grid: Res<SpatialGrid>,
    observer: Query<&Transform, With<Player>>,
    npcs: Query<(&EntityId, &Transform), (With<Species>, Without<Player>)>,
) {
    let Ok(observer) = observer.get_single() else {
        return;
    };
    let center = observer.position;
    let spawner = &config.spawner;
    let multipliers = env.difficulty.multipliers();
    let ceiling = spawner.population_ceiling(multipliers.spawn_rate);
    let population = npcs.iter().count();

    if population > ceiling {
        let farthest = npcs.iter().max_by(|(a_id, a), (b_id, b)| {
            a.planar_distance_sq(center)
                .total_cmp(&b.planar_distance_sq(center))
                .then(b_id.cmp(a_id))
        });
        if let Some((id, _)) = farthest {
            registry.unregister(*id);
            despawn_tracked(&mut commands, &mut index, *id);
            debug!(id = id.0, population, ceiling, "culled creature over ceiling");
        }
        return;
    }
    if population == ceiling {
        return;
    }

    let share = spawner.predator_share(env.time.phase == DayPhase::Night);
    let predator = rng.0.gen_bool(share);
    let table = env.biome.current().spawn_table;
    let Some(template) = table
        .draw(predator, &mut rng.0)
        .or_else(|| table.draw(!predator, &mut rng.0))
    else {
        return;
    };

    let Some(position) = pick_spawn_point(center, &config, &grid, &npcs, &mut rng) else {
        debug!(species = template.id, "no clear spawn point this tick");
        return;
    };

    let (bundle, effect) = template.bundle(position, multipliers.health);
    let id = match effect {
        Some(effect) => spawn_tracked(&mut commands, &mut index, (bundle, effect)),
        None => spawn_tracked(&mut commands, &mut index, bundle),
    };
    debug!(id = id.0, species = template.id, x = position.x, z = position.z, "spawned creature");
}

/// A point in the annulus around `center` with nothing within the
/// configured spacing. Gives up after the configured number of samples.
fn pick_spawn_point(
    center: Vec3,
    config: &SimConfig,
    grid: &SpatialGrid,
    npcs: &Query<(&EntityId, &Transform), (With<Species>, Without<Player>)>,
    rng: &mut SimRng,
) -> Option<Vec3> {
    let spawner = &config.spawner;
    let inner = spawner.inner_radius.max(0.0);
    let outer = spawner.outer_radius.max(inner);
    let spacing_sq = spawner.min_spacing * spawner.min_spacing;
    let bound = config.world_half_extent.abs();

    for _ in 0..spawner.max_attempts.max(1) {
        let angle = rng.0.gen_range(0.0..TAU);
        let radius = if outer > inner { rng.0.gen_range(inner..outer) } else { inner };
        let candidate = Vec3::new(
            (center.x + angle.cos() * radius).clamp(-bound, bound),
            0.0,
            (center.z + angle.sin() * radius).clamp(-bound, bound),
        );
        // The grid lags a step behind, so check fresh spawns directly too.
        let crowded = grid.any_within(candidate.x, candidate.z, spawner.min_spacing, None)
            || npcs
                .iter()
                .any(|(_, t)| t.planar_distance_sq(candidate) < spacing_sq);
        if !crowded {
            return Some(candidate);
        }
    }
    None
}
