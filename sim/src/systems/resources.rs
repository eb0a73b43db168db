//! Collectable resource nodes.

use crate::components::*;
use crate::config::SimConfig;
use crate::notify::{Notice, Outbox, Progress};
use crate::store::EntityId;
use crate::systems::clock::SimClock;
use bevy_ecs::prelude::*;
use tracing::debug;

/// Makes collected nodes available again once their respawn time passed.
pub fn resource_respawn_system(clock: Res<SimClock>, mut nodes: Query<(&EntityId, &mut ResourceNode)>) {
    for (id, mut node) in nodes.iter_mut() {
        if node.collected && node.try_respawn(clock.elapsed) {
            debug!(id = id.0, kind = ?node.kind, "resource respawned");
        }
    }
}

/// The observer picks up any available node within reach.
pub fn resource_pickup_system(
    clock: Res<SimClock>,
    config: Res<SimConfig>,
    mut outbox: ResMut<Outbox>,
    mut progress: ResMut<Progress>,
    mut observer: Query<(&Transform, &mut Species), With<Player>>,
    mut nodes: Query<(&EntityId, &Transform, &mut ResourceNode), Without<Player>>,
) {
    let Ok((observer_transform, mut species)) = observer.get_single_mut() else {
        return;
    };
    if !species.is_alive() {
        return;
    }
    let reach_sq = config.pickup_radius * config.pickup_radius;
    for (id, transform, mut node) in nodes.iter_mut() {
        if node.collected || transform.planar_distance_sq(observer_transform.position) > reach_sq {
            continue;
        }
        if let Some(restore) = node.collect(clock.elapsed) {
            apply_restore(&mut species, restore);
            progress.resources_collected += 1;
            outbox.push(Notice::ResourceCollected {
                id: *id,
                health: restore.health,
                stamina: restore.stamina,
            });
            debug!(id = id.0, kind = ?node.kind, "resource collected");
        }
    }
}

/// Heal and refresh from a collected node. Values clamp on the way in.
pub fn apply_restore(species: &mut Species, restore: Restore) {
    species.heal(restore.health);
    species.restore_stamina(restore.stamina);
}
