//! Systems owning the `Environment` resource.

use crate::components::{Player, Transform};
use crate::environment::Environment;
use crate::notify::{Notice, Outbox};
use crate::systems::clock::{DeltaTime, SimClock, SimRng};
use bevy_ecs::prelude::*;
use tracing::info;

/// Advances the clock, weather and world events.
///
/// ## Data Access
/// - Reads: DeltaTime, SimClock
/// - Writes: Environment, SimRng, Outbox
pub fn environment_system(
    dt: Res<DeltaTime>,
    clock: Res<SimClock>,
    mut env: ResMut<Environment>,
    mut rng: ResMut<SimRng>,
    mut outbox: ResMut<Outbox>,
) {
    let delta = dt.0;

    if env.time.advance(delta) {
        info!(day = env.time.day_count, "new day");
        outbox.push(Notice::NewDay { day: env.time.day_count });
    }

    let biome = env.biome.kind();
    if let Some((from, to)) = env.weather.update(delta, biome, &mut rng.0) {
        info!(?from, ?to, "weather changed");
        outbox.push(Notice::WeatherChanged { from, to });
    }

    let phase = env.time.phase;
    let changes = env.events.update(clock.elapsed, delta, phase, &mut rng.0);
    for event in changes.started {
        info!(?event, "world event started");
        outbox.push(Notice::WorldEventStarted { event });
    }
    for event in changes.ended {
        info!(?event, "world event ended");
        outbox.push(Notice::WorldEventEnded { event });
    }
}

/// Resolves the current biome from the observer's position.
pub fn biome_system(
    dt: Res<DeltaTime>,
    mut env: ResMut<Environment>,
    mut outbox: ResMut<Outbox>,
    observer: Query<&Transform, With<Player>>,
) {
    let Ok(transform) = observer.get_single() else {
        return;
    };
    let position = transform.position;
    if let Some((from, to)) = env.biome.update(position.x, position.z, dt.0) {
        info!(?from, ?to, "biome changed");
        outbox.push(Notice::BiomeChanged { from, to });
    }
}
