//! Combat resolution.
//!
//! Two independent paths:
//! - **Proximity**: attacking predators within contact distance of the
//!   observer hurt it, on a fixed interval.
//! - **Events**: an `AttackEvent` (origin, radius, damage) from outside the
//!   simulation hits every living creature inside the radius.
//!
//! A predator that survives an attack event answers with a counter-attack
//! after a delay. Deferred effects re-check that the situation they were
//! scheduled for still holds before doing anything.

use crate::components::*;
use crate::config::SimConfig;
use crate::environment::Environment;
use crate::notify::{Notice, Outbox, Progress};
use crate::store::{EntityId, EntityIndex};
use crate::systems::clock::{DeltaTime, SimClock};
use bevy_ecs::prelude::*;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Time since the last proximity pass.
#[derive(Resource, Debug, Default)]
pub struct CombatClock {
    pub since_last: f32,
}

/// Whose move it is in the player-versus-creature exchange.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatTurn {
    /// Increments with every attack event.
    pub turn: u64,
    /// The creature expected to answer, if any.
    pub awaiting: Option<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackEvent {
    pub origin: Vec3,
    pub radius: f32,
    pub damage: f32,
}

/// Attack events waiting for the next tick.
#[derive(Resource, Debug, Default)]
pub struct PendingAttacks(pub Vec<AttackEvent>);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeferredKind {
    CounterAttack { attacker: EntityId, turn: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeferredEffect {
    pub fire_at: f32,
    pub kind: DeferredKind,
}

/// One-shot timers. Cancelling one means letting its re-validation fail.
#[derive(Resource, Debug, Default)]
pub struct DeferredEffects {
    pending: Vec<DeferredEffect>,
}

impl DeferredEffects {
    pub fn schedule(&mut self, fire_at: f32, kind: DeferredKind) {
        self.pending.push(DeferredEffect { fire_at, kind });
    }

    /// Remove and return every effect due at `now`, earliest first.
    pub fn take_due(&mut self, now: f32) -> Vec<DeferredEffect> {
        let (mut due, rest): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|e| e.fire_at <= now);
        self.pending = rest;
        due.sort_by(|a, b| a.fire_at.total_cmp(&b.fire_at));
        due
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// ============================================================================
// EVENT PATH
// ============================================================================

/// Applies queued attack events to every living creature in range.
#[allow(clippy::too_many_arguments)]
pub fn attack_event_system(
    mut commands: Commands,
    clock: Res<SimClock>,
    config: Res<SimConfig>,
    env: Res<Environment>,
    mut pending: ResMut<PendingAttacks>,
    mut turn: ResMut<CombatTurn>,
    mut deferred: ResMut<DeferredEffects>,
    mut outbox: ResMut<Outbox>,
    mut progress: ResMut<Progress>,
    mut targets: Query<(Entity, &EntityId, &Transform, &mut Species, Has<RewardClaimed>), Without<Player>>,
) {
    for event in pending.0.drain(..) {
        if !event.radius.is_finite() || event.radius < 0.0 || !event.origin.is_finite() {
            debug!(?event, "ignored malformed attack event");
            continue;
        }
        turn.turn += 1;
        turn.awaiting = None;

        let radius_sq = event.radius * event.radius;
        let mut responder: Option<(f32, EntityId)> = None;

        for (entity, id, transform, mut species, claimed) in targets.iter_mut() {
            if !species.is_alive() {
                continue;
            }
            let distance_sq = transform.planar_distance_sq(event.origin);
            if distance_sq > radius_sq {
                continue;
            }

            if species.apply_damage(event.damage) {
                if claimed {
                    continue;
                }
                let currency = config.spawner.base_currency(species.kind);
                let experience = config.spawner.base_experience(species.kind) * env.experience_multiplier();
                progress.currency += currency;
                progress.experience += experience;
                progress.kills += 1;
                outbox.push(Notice::CurrencyAwarded {
                    amount: currency,
                    source: *id,
                });
                outbox.push(Notice::ExperienceAwarded {
                    amount: experience,
                    source: *id,
                });
                commands.entity(entity).insert(RewardClaimed);
                debug!(id = id.0, species = %species.id, "killed by attack event");
            } else if species.kind == SpeciesKind::Predator
                && responder.map_or(true, |(best, _)| distance_sq < best)
            {
                responder = Some((distance_sq, *id));
            }
        }

        if let Some((_, attacker)) = responder {
            turn.awaiting = Some(attacker);
            deferred.schedule(
                clock.elapsed + config.counter_attack_delay,
                DeferredKind::CounterAttack {
                    attacker,
                    turn: turn.turn,
                },
            );
        }
    }
}

// ============================================================================
// PROXIMITY PATH
// ============================================================================

/// Attack-state predators in contact with the observer damage it.
#[allow(clippy::too_many_arguments)]
pub fn proximity_combat_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    clock: Res<SimClock>,
    config: Res<SimConfig>,
    env: Res<Environment>,
    mut combat_clock: ResMut<CombatClock>,
    mut outbox: ResMut<Outbox>,
    mut observer: Query<(Entity, &Transform, &mut Species, Option<&mut SlowDebuff>), With<Player>>,
    mut attackers: Query<(&EntityId, &Transform, &Species, &mut Combat, Option<&EnemyEffect>), Without<Player>>,
) {
    combat_clock.since_last += dt.0;
    if combat_clock.since_last < config.combat_interval {
        return;
    }
    combat_clock.since_last = 0.0;

    let Ok((player, observer_transform, mut player_species, mut slow)) = observer.get_single_mut() else {
        return;
    };
    if !player_species.is_alive() {
        return;
    }

    let now = clock.elapsed;
    let contact_sq = config.contact_distance * config.contact_distance;
    let mut new_slow: Option<f32> = None;

    for (id, transform, species, mut combat, effect) in attackers.iter_mut() {
        if species.kind != SpeciesKind::Predator
            || species.state() != SpeciesState::Attack
            || !species.is_alive()
            || transform.planar_distance_sq(observer_transform.position) > contact_sq
            || !combat.ready(now)
        {
            continue;
        }
        combat.last_attack_time = Some(now);
        let damage = combat.damage * env.enemy_damage_multiplier() * effect_damage_multiplier(effect);
        let killed = player_species.apply_damage(damage);

        if let Some(curse) = effect.filter(|e| e.kind == EnemyEffectKind::Curse && e.active) {
            match slow.as_mut() {
                Some(existing) => existing.refresh(config.curse_duration, curse.value),
                None => {
                    new_slow = Some(new_slow.map_or(curse.value, |f| f.min(curse.value)));
                }
            }
        }

        if killed {
            info!(killer = id.0, "player died");
            outbox.push(Notice::PlayerDied { killer: Some(*id) });
            break;
        }
    }

    if let Some(factor) = new_slow {
        commands.entity(player).insert(SlowDebuff::new(config.curse_duration, factor));
    }
}

// ============================================================================
// DEFERRED EFFECTS
// ============================================================================

/// Fires due one-shot effects after re-validating them.
#[allow(clippy::too_many_arguments)]
pub fn deferred_effect_system(
    clock: Res<SimClock>,
    config: Res<SimConfig>,
    env: Res<Environment>,
    index: Res<EntityIndex>,
    mut deferred: ResMut<DeferredEffects>,
    mut turn: ResMut<CombatTurn>,
    mut outbox: ResMut<Outbox>,
    mut observer: Query<(&Transform, &mut Species), With<Player>>,
    attackers: Query<(&Transform, &Species, &Combat, Option<&EnemyEffect>), Without<Player>>,
) {
    for effect in deferred.take_due(clock.elapsed) {
        match effect.kind {
            DeferredKind::CounterAttack { attacker, turn: scheduled } => {
                if turn.turn != scheduled || turn.awaiting != Some(attacker) {
                    debug!(attacker = attacker.0, "stale counter-attack dropped");
                    continue;
                }
                turn.awaiting = None;

                let Some(entity) = index.resolve(attacker) else {
                    debug!(attacker = attacker.0, "counter-attacker gone");
                    continue;
                };
                let Ok((transform, species, combat, enemy_effect)) = attackers.get(entity) else {
                    continue;
                };
                let Ok((observer_transform, mut player_species)) = observer.get_single_mut() else {
                    continue;
                };
                let reach = config.contact_distance + combat.attack_range;
                if !species.is_alive()
                    || !player_species.is_alive()
                    || transform.planar_distance_sq(observer_transform.position) > reach * reach
                {
                    debug!(attacker = attacker.0, "counter-attack no longer valid");
                    continue;
                }

                let damage =
                    combat.damage * env.enemy_damage_multiplier() * effect_damage_multiplier(enemy_effect);
                if player_species.apply_damage(damage) {
                    info!(killer = attacker.0, "player died to counter-attack");
                    outbox.push(Notice::PlayerDied { killer: Some(attacker) });
                }
            }
        }
    }
}

/// Counts down slow debuffs and removes expired ones.
pub fn slow_debuff_system(dt: Res<DeltaTime>, mut commands: Commands, mut slowed: Query<(Entity, &mut SlowDebuff)>) {
    for (entity, mut slow) in slowed.iter_mut() {
        slow.remaining -= dt.0;
        if slow.remaining <= 0.0 {
            commands.entity(entity).remove::<SlowDebuff>();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data;
    use crate::environment::Difficulty;

    fn setup() -> (World, Schedule) {
        let mut world = World::new();
        world.insert_resource(DeltaTime(0.1));
        world.insert_resource(SimClock::default());
        world.insert_resource(SimConfig::default());
        world.insert_resource(Environment::default());
        world.insert_resource(CombatClock::default());
        world.insert_resource(CombatTurn::default());
        world.insert_resource(PendingAttacks::default());
        world.insert_resource(DeferredEffects::default());
        world.insert_resource(Outbox::default());
        world.insert_resource(Progress::default());
        world.init_resource::<EntityIndex>();

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                crate::systems::clock::clock_system,
                attack_event_system,
                proximity_combat_system,
                deferred_effect_system,
                slow_debuff_system,
            )
                .chain(),
        );
        (world, schedule)
    }

    fn spawn(world: &mut World, species: &str, position: Vec3) -> (EntityId, Entity) {
        let (bundle, effect) = data::species(species).unwrap().bundle(position, 1.0);
        let id = world.resource_mut::<EntityIndex>().allocate();
        let mut entity = world.spawn((id, bundle));
        if let Some(effect) = effect {
            entity.insert(effect);
        }
        let entity = entity.id();
        world.resource_mut::<EntityIndex>().bind(id, entity);
        (id, entity)
    }

    fn spawn_player(world: &mut World) -> Entity {
        let id = world.resource_mut::<EntityIndex>().allocate();
        let entity = world.spawn((id, PlayerBundle::new(Vec3::ZERO))).id();
        world.resource_mut::<EntityIndex>().bind(id, entity);
        entity
    }

    fn attack(world: &mut World, origin: Vec3, radius: f32, damage: f32) {
        world.resource_mut::<PendingAttacks>().0.push(AttackEvent { origin, radius, damage });
    }

    #[test]
    fn test_attack_event_hits_only_inside_radius() {
        let (mut world, mut schedule) = setup();
        spawn_player(&mut world);
        let (_, near) = spawn(&mut world, "deer", Vec3::new(2.0, 0.0, 0.0));
        let (_, far) = spawn(&mut world, "deer", Vec3::new(20.0, 0.0, 0.0));
        attack(&mut world, Vec3::ZERO, 5.0, 10.0);
        schedule.run(&mut world);

        assert_eq!(world.get::<Species>(near).unwrap().health(), 30.0);
        assert_eq!(world.get::<Species>(far).unwrap().health(), 40.0);
    }

    #[test]
    fn test_kill_rewards_exactly_once() {
        let (mut world, mut schedule) = setup();
        spawn_player(&mut world);
        let (_, rabbit) = spawn(&mut world, "rabbit", Vec3::new(1.0, 0.0, 0.0));
        attack(&mut world, Vec3::ZERO, 5.0, 100.0);
        schedule.run(&mut world);
        attack(&mut world, Vec3::ZERO, 5.0, 100.0);
        schedule.run(&mut world);

        let progress = world.resource::<Progress>();
        assert_eq!(progress.kills, 1);
        assert_eq!(progress.currency, 2);
        assert_eq!(progress.experience, 10.0);
        assert!(world.get::<RewardClaimed>(rabbit).is_some());
    }

    #[test]
    fn test_surviving_predator_counter_attacks() {
        let (mut world, mut schedule) = setup();
        let player = spawn_player(&mut world);
        let (bear_id, _) = spawn(&mut world, "bear", Vec3::new(1.0, 0.0, 0.0));
        attack(&mut world, Vec3::ZERO, 5.0, 10.0);
        schedule.run(&mut world);
        assert_eq!(world.resource::<CombatTurn>().awaiting, Some(bear_id));

        for _ in 0..10 {
            schedule.run(&mut world);
        }
        assert_eq!(world.get::<Species>(player).unwrap().health(), 85.0);
        assert_eq!(world.resource::<CombatTurn>().awaiting, None);
    }

    #[test]
    fn test_counter_attack_revalidates() {
        let (mut world, mut schedule) = setup();
        let player = spawn_player(&mut world);
        let (_, wolf) = spawn(&mut world, "wolf", Vec3::new(1.0, 0.0, 0.0));
        attack(&mut world, Vec3::ZERO, 5.0, 10.0);
        schedule.run(&mut world);

        // The wolf wanders off before its counter fires.
        world.get_mut::<Transform>(wolf).unwrap().position = Vec3::new(50.0, 0.0, 0.0);
        for _ in 0..10 {
            schedule.run(&mut world);
        }
        assert_eq!(world.get::<Species>(player).unwrap().health(), 100.0);

        // A newer attack supersedes an older pending counter.
        world.get_mut::<Transform>(wolf).unwrap().position = Vec3::new(1.0, 0.0, 0.0);
        attack(&mut world, Vec3::ZERO, 5.0, 1.0);
        schedule.run(&mut world);
        attack(&mut world, Vec3::new(100.0, 0.0, 0.0), 1.0, 1.0);
        for _ in 0..10 {
            schedule.run(&mut world);
        }
        assert_eq!(world.get::<Species>(player).unwrap().health(), 100.0);
        assert!(world.resource::<DeferredEffects>().is_empty());
    }

    #[test]
    fn test_proximity_damage_scales_with_difficulty() {
        let (mut world, mut schedule) = setup();
        world.resource_mut::<Environment>().difficulty = Difficulty::Nightmare;
        let player = spawn_player(&mut world);
        let (_, wolf) = spawn(&mut world, "wolf", Vec3::new(1.0, 0.0, 0.0));
        world.get_mut::<Species>(wolf).unwrap().set_state(SpeciesState::Attack);

        schedule.run(&mut world);
        assert_eq!(world.get::<Species>(player).unwrap().health(), 84.0);

        // Cooldown: no second hit within the same second.
        for _ in 0..5 {
            schedule.run(&mut world);
        }
        assert_eq!(world.get::<Species>(player).unwrap().health(), 84.0);
    }

    #[test]
    fn test_idle_predator_does_not_hurt() {
        let (mut world, mut schedule) = setup();
        let player = spawn_player(&mut world);
        spawn(&mut world, "wolf", Vec3::new(1.0, 0.0, 0.0));
        for _ in 0..20 {
            schedule.run(&mut world);
        }
        assert_eq!(world.get::<Species>(player).unwrap().health(), 100.0);
    }

    #[test]
    fn test_curse_applies_single_refreshable_slow() {
        let (mut world, mut schedule) = setup();
        let player = spawn_player(&mut world);
        for x in [1.0, -1.0] {
            let (_, scorpion) = spawn(&mut world, "scorpion", Vec3::new(x, 0.0, 0.0));
            world.get_mut::<Species>(scorpion).unwrap().set_state(SpeciesState::Attack);
        }
        schedule.run(&mut world);
        let slow = *world.get::<SlowDebuff>(player).unwrap();
        assert!((slow.factor - 0.6).abs() < 1e-5);

        // Scorpions hit again after their cooldown; the debuff is refreshed,
        // not stacked, and eventually expires once they stop.
        for _ in 0..9 {
            schedule.run(&mut world);
        }
        assert!(world.get::<SlowDebuff>(player).unwrap().remaining > 2.5);

        let mut query = world.query_filtered::<&mut Species, Without<Player>>();
        for mut species in query.iter_mut(&mut world) {
            species.kill();
        }
        for _ in 0..40 {
            schedule.run(&mut world);
        }
        assert!(world.get::<SlowDebuff>(player).is_none());
    }
}
