//! Per-agent behaviour state machine.
//!
//! Each autonomous agent owns one `StateMachine`. A state's `enter` picks
//! the steering behaviours that drive it, `execute` runs once per
//! behavioural tick and checks the transition conditions, and `exit`
//! tears the behaviours down again. Every transition is checked against
//! `BehaviorState::can_transition_to`; anything else is rejected.
//!
//! Death is not a behavioural state. A dead creature's machine is halted
//! and skipped, see `Species::set_state`.

use crate::components::{planar_distance_sq, SpeciesKind, SpeciesState};
use crate::spatial::SpatialGrid;
use crate::steering::SteeringSet;
use crate::store::EntityId;
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Seconds between two strikes in the Attack state.
pub const ATTACK_COOLDOWN: f32 = 1.0;
/// Give up fleeing after this long.
pub const FLEE_TIMEOUT: f32 = 10.0;
/// Give up chasing after this long.
pub const CHASE_TIMEOUT: f32 = 15.0;

const IDLE_DWELL: (f32, f32) = (1.0, 4.0);
const WANDER_DURATION: (f32, f32) = (3.0, 7.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorState {
    #[default]
    Idle,
    Wander,
    Flee,
    Chase,
    Attack,
}

impl BehaviorState {
    pub const ALL: [BehaviorState; 5] = [
        BehaviorState::Idle,
        BehaviorState::Wander,
        BehaviorState::Flee,
        BehaviorState::Chase,
        BehaviorState::Attack,
    ];

    /// Multiplier applied to the agent's max speed while in this state.
    pub fn speed_multiplier(self) -> f32 {
        match self {
            BehaviorState::Idle | BehaviorState::Wander => 1.0,
            BehaviorState::Flee | BehaviorState::Chase => 1.5,
            BehaviorState::Attack => 0.5,
        }
    }

    /// The authorised transitions. Nothing outside this table ever happens.
    pub fn can_transition_to(self, next: BehaviorState) -> bool {
        use BehaviorState::*;
        matches!(
            (self, next),
            (Idle, Wander)
                | (Idle, Flee)
                | (Idle, Chase)
                | (Wander, Flee)
                | (Wander, Chase)
                | (Wander, Idle)
                | (Flee, Idle)
                | (Chase, Attack)
                | (Chase, Idle)
                | (Attack, Chase)
                | (Attack, Idle)
        )
    }

    /// How the state shows up on the `Species` component.
    pub fn species_state(self) -> SpeciesState {
        match self {
            BehaviorState::Idle => SpeciesState::Idle,
            BehaviorState::Wander => SpeciesState::Walk,
            BehaviorState::Flee => SpeciesState::Flee,
            BehaviorState::Chase => SpeciesState::Chase,
            BehaviorState::Attack => SpeciesState::Attack,
        }
    }

    /// Boosted states burn stamina; the rest recover it.
    pub fn drains_stamina(self) -> bool {
        matches!(self, BehaviorState::Flee | BehaviorState::Chase)
    }
}

/// What an agent knows about itself at the start of a behavioural tick.
#[derive(Debug, Clone, Copy)]
pub struct Percept {
    pub id: EntityId,
    pub kind: SpeciesKind,
    pub position: Vec3,
    /// Awareness radius after environmental scaling.
    pub awareness: f32,
    pub attack_range: f32,
}

/// Another entity as seen by the behaviour layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub position: Vec3,
    pub kind: SpeciesKind,
    pub alive: bool,
}

/// Shared, read-only view of the world for one behavioural tick.
pub struct StepContext<'a> {
    pub dt: f32,
    pub grid: &'a SpatialGrid,
    pub bodies: &'a HashMap<EntityId, Body>,
}

impl StepContext<'_> {
    /// A live body for a weak reference. `None` means the target is lost.
    fn live_body(&self, id: Option<EntityId>) -> Option<Body> {
        id.and_then(|id| self.bodies.get(&id)).copied().filter(|body| body.alive)
    }
}

/// A landed attack, resolved by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strike {
    pub attacker: EntityId,
    pub target: EntityId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateMachine {
    state: BehaviorState,
    /// Seconds spent in the current state.
    elapsed: f32,
    /// Randomised dwell for Idle and Wander; unused otherwise.
    duration: f32,
    threat: Option<EntityId>,
    target: Option<EntityId>,
    attack_cooldown: f32,
    transitions: u64,
}

impl StateMachine {
    /// A machine in Idle, with the Idle behaviours already configured.
    pub fn new(steering: &mut SteeringSet, rng: &mut SmallRng) -> Self {
        let mut machine = Self {
            state: BehaviorState::Idle,
            elapsed: 0.0,
            duration: 0.0,
            threat: None,
            target: None,
            attack_cooldown: 0.0,
            transitions: 0,
        };
        machine.enter(steering, rng);
        machine
    }

    pub fn state(&self) -> BehaviorState {
        self.state
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Seconds left before Idle or Wander times out.
    pub fn remaining(&self) -> f32 {
        match self.state {
            BehaviorState::Idle | BehaviorState::Wander => (self.duration - self.elapsed).max(0.0),
            _ => 0.0,
        }
    }

    /// The entity this agent is reacting to, if any.
    pub fn focus(&self) -> Option<EntityId> {
        match self.state {
            BehaviorState::Flee => self.threat,
            BehaviorState::Chase | BehaviorState::Attack => self.target,
            _ => None,
        }
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Move to `next` through `exit` and `enter`. Returns `false` and leaves
    /// the machine untouched if the table forbids the transition.
    pub fn change_to(&mut self, next: BehaviorState, steering: &mut SteeringSet, rng: &mut SmallRng) -> bool {
        if !self.state.can_transition_to(next) {
            warn!(from = ?self.state, to = ?next, "rejected behavior transition");
            return false;
        }
        let previous = self.state;
        self.exit(steering);
        self.state = next;
        self.enter(steering, rng);
        self.transitions += 1;
        debug!(from = ?previous, to = ?next, "behavior transition");
        true
    }

    /// Stop driving the agent. Used once the creature is dead.
    pub fn halt(&mut self, steering: &mut SteeringSet) {
        steering.clear();
        self.threat = None;
        self.target = None;
    }

    fn enter(&mut self, steering: &mut SteeringSet, rng: &mut SmallRng) {
        self.elapsed = 0.0;
        steering.clear();
        match self.state {
            BehaviorState::Idle => {
                self.duration = rng.gen_range(IDLE_DWELL.0..=IDLE_DWELL.1);
                self.threat = None;
                self.target = None;
                steering.separation = true;
            }
            BehaviorState::Wander => {
                self.duration = rng.gen_range(WANDER_DURATION.0..=WANDER_DURATION.1);
                steering.wander_on = true;
                steering.separation = true;
            }
            // Positions are filled in by `execute` every tick.
            BehaviorState::Flee | BehaviorState::Chase | BehaviorState::Attack => {
                self.duration = 0.0;
            }
        }
    }

    fn exit(&mut self, steering: &mut SteeringSet) {
        steering.clear();
    }

    /// Run one behavioural tick. Returns a strike when an attack lands on a
    /// non-player target; the observer is handled by proximity combat.
    pub fn execute(
        &mut self,
        me: &Percept,
        steering: &mut SteeringSet,
        ctx: &StepContext<'_>,
        rng: &mut SmallRng,
    ) -> Option<Strike> {
        let dt = if ctx.dt.is_finite() { ctx.dt.max(0.0) } else { 0.0 };
        self.elapsed += dt;
        self.attack_cooldown = (self.attack_cooldown - dt).max(0.0);

        let disengage_sq = (2.0 * me.awareness).powi(2);
        let range_sq = me.attack_range * me.attack_range;

        match self.state {
            BehaviorState::Idle | BehaviorState::Wander => {
                if self.react(me, steering, ctx, rng) {
                    return None;
                }
                if self.elapsed >= self.duration {
                    let next = if self.state == BehaviorState::Idle {
                        BehaviorState::Wander
                    } else {
                        BehaviorState::Idle
                    };
                    self.change_to(next, steering, rng);
                }
                None
            }
            BehaviorState::Flee => {
                let Some(threat) = ctx.live_body(self.threat) else {
                    debug!(agent = me.id.0, "threat gone");
                    self.change_to(BehaviorState::Idle, steering, rng);
                    return None;
                };
                if planar_distance_sq(me.position, threat.position) > disengage_sq
                    || self.elapsed > FLEE_TIMEOUT
                {
                    self.change_to(BehaviorState::Idle, steering, rng);
                } else {
                    steering.flee = Some(threat.position);
                }
                None
            }
            BehaviorState::Chase => {
                let Some(target) = ctx.live_body(self.target) else {
                    debug!(agent = me.id.0, "chase target lost");
                    self.change_to(BehaviorState::Idle, steering, rng);
                    return None;
                };
                let distance_sq = planar_distance_sq(me.position, target.position);
                if distance_sq > disengage_sq || self.elapsed > CHASE_TIMEOUT {
                    self.change_to(BehaviorState::Idle, steering, rng);
                } else if distance_sq < range_sq {
                    self.change_to(BehaviorState::Attack, steering, rng);
                    steering.arrive = Some(target.position);
                } else {
                    steering.seek = Some(target.position);
                }
                None
            }
            BehaviorState::Attack => {
                let Some(target) = ctx.live_body(self.target) else {
                    self.change_to(BehaviorState::Idle, steering, rng);
                    return None;
                };
                if planar_distance_sq(me.position, target.position) >= range_sq {
                    self.change_to(BehaviorState::Chase, steering, rng);
                    steering.seek = Some(target.position);
                    return None;
                }
                steering.arrive = Some(target.position);
                if self.attack_cooldown > 0.0 {
                    return None;
                }
                self.attack_cooldown = ATTACK_COOLDOWN;
                match (target.kind, self.target) {
                    (SpeciesKind::Player, _) | (_, None) => None,
                    (_, Some(target_id)) => Some(Strike {
                        attacker: me.id,
                        target: target_id,
                    }),
                }
            }
        }
    }

    /// Look for something to run from or hunt. Returns `true` on a transition.
    fn react(
        &mut self,
        me: &Percept,
        steering: &mut SteeringSet,
        ctx: &StepContext<'_>,
        rng: &mut SmallRng,
    ) -> bool {
        let x = me.position.x;
        let z = me.position.z;
        match me.kind {
            SpeciesKind::Prey => {
                let Some(threat) = ctx.grid.nearest_of_kind(x, z, me.awareness, &[SpeciesKind::Predator], me.id)
                else {
                    return false;
                };
                if self.change_to(BehaviorState::Flee, steering, rng) {
                    self.threat = Some(threat.id);
                    steering.flee = Some(Vec3::new(threat.x, 0.0, threat.z));
                    return true;
                }
                false
            }
            SpeciesKind::Predator => {
                let Some(prey) = ctx.grid.nearest_of_kind(
                    x,
                    z,
                    me.awareness,
                    &[SpeciesKind::Prey, SpeciesKind::Player],
                    me.id,
                ) else {
                    return false;
                };
                if self.change_to(BehaviorState::Chase, steering, rng) {
                    self.target = Some(prey.id);
                    steering.seek = Some(Vec3::new(prey.x, 0.0, prey.z));
                    return true;
                }
                false
            }
            SpeciesKind::Player => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    struct Scene {
        grid: SpatialGrid,
        bodies: HashMap<EntityId, Body>,
    }

    impl Scene {
        fn new() -> Self {
            Self {
                grid: SpatialGrid::new(8.0, 256.0),
                bodies: HashMap::new(),
            }
        }

        fn put(&mut self, id: u64, kind: SpeciesKind, x: f32, z: f32) {
            let id = EntityId(id);
            self.grid.insert(id, x, z, kind);
            self.bodies.insert(
                id,
                Body {
                    position: Vec3::new(x, 0.0, z),
                    kind,
                    alive: true,
                },
            );
        }

        fn kill(&mut self, id: u64) {
            self.grid.remove(EntityId(id));
            if let Some(body) = self.bodies.get_mut(&EntityId(id)) {
                body.alive = false;
            }
        }

        fn ctx(&self, dt: f32) -> StepContext<'_> {
            StepContext {
                dt,
                grid: &self.grid,
                bodies: &self.bodies,
            }
        }
    }

    fn percept(id: u64, kind: SpeciesKind, x: f32, z: f32) -> Percept {
        Percept {
            id: EntityId(id),
            kind,
            position: Vec3::new(x, 0.0, z),
            awareness: 10.0,
            attack_range: 1.5,
        }
    }

    #[test]
    fn test_transition_table_is_exact() {
        use BehaviorState::*;
        let allowed = [
            (Idle, Wander),
            (Idle, Flee),
            (Idle, Chase),
            (Wander, Flee),
            (Wander, Chase),
            (Wander, Idle),
            (Flee, Idle),
            (Chase, Attack),
            (Chase, Idle),
            (Attack, Chase),
            (Attack, Idle),
        ];
        for from in BehaviorState::ALL {
            for to in BehaviorState::ALL {
                assert_eq!(from.can_transition_to(to), allowed.contains(&(from, to)), "{from:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn test_change_to_rejects_unlisted_transition() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut steering = SteeringSet::default();
        let mut machine = StateMachine::new(&mut steering, &mut rng);

        assert!(!machine.change_to(BehaviorState::Attack, &mut steering, &mut rng));
        assert_eq!(machine.state(), BehaviorState::Idle);
        assert!(steering.separation, "rejected transition leaves behaviours alone");

        assert!(machine.change_to(BehaviorState::Wander, &mut steering, &mut rng));
        assert!(steering.wander_on && steering.separation);
        assert_eq!(machine.transitions(), 1);
    }

    #[test]
    fn test_prey_flees_then_returns_to_idle() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut steering = SteeringSet::default();
        let mut machine = StateMachine::new(&mut steering, &mut rng);
        let mut scene = Scene::new();
        scene.put(1, SpeciesKind::Prey, 0.0, 0.0);
        scene.put(2, SpeciesKind::Predator, 6.0, 0.0);

        let me = percept(1, SpeciesKind::Prey, 0.0, 0.0);
        machine.execute(&me, &mut steering, &scene.ctx(0.05), &mut rng);
        assert_eq!(machine.state(), BehaviorState::Flee);
        assert_eq!(machine.focus(), Some(EntityId(2)));
        assert_eq!(steering.flee, Some(Vec3::new(6.0, 0.0, 0.0)));

        // Still inside twice the awareness radius: keep running.
        let me = percept(1, SpeciesKind::Prey, -12.0, 0.0);
        machine.execute(&me, &mut steering, &scene.ctx(0.05), &mut rng);
        assert_eq!(machine.state(), BehaviorState::Flee);

        let me = percept(1, SpeciesKind::Prey, -20.0, 0.0);
        machine.execute(&me, &mut steering, &scene.ctx(0.05), &mut rng);
        assert_eq!(machine.state(), BehaviorState::Idle);
        assert!(steering.flee.is_none());
    }

    #[test]
    fn test_flee_gives_up_when_threat_vanishes_or_times_out() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut steering = SteeringSet::default();
        let mut machine = StateMachine::new(&mut steering, &mut rng);
        let mut scene = Scene::new();
        scene.put(2, SpeciesKind::Predator, 3.0, 0.0);
        let me = percept(1, SpeciesKind::Prey, 0.0, 0.0);

        machine.execute(&me, &mut steering, &scene.ctx(0.05), &mut rng);
        assert_eq!(machine.state(), BehaviorState::Flee);
        scene.bodies.remove(&EntityId(2));
        scene.grid.remove(EntityId(2));
        machine.execute(&me, &mut steering, &scene.ctx(0.05), &mut rng);
        assert_eq!(machine.state(), BehaviorState::Idle);

        scene.put(3, SpeciesKind::Predator, 3.0, 0.0);
        machine.execute(&me, &mut steering, &scene.ctx(0.05), &mut rng);
        assert_eq!(machine.state(), BehaviorState::Flee);
        machine.execute(&me, &mut steering, &scene.ctx(FLEE_TIMEOUT + 0.1), &mut rng);
        assert_eq!(machine.state(), BehaviorState::Idle);
    }

    #[test]
    fn test_predator_chases_attacks_and_strikes() {
        let mut rng = SmallRng::seed_from_u64(9);
        let mut steering = SteeringSet::default();
        let mut machine = StateMachine::new(&mut steering, &mut rng);
        let mut scene = Scene::new();
        scene.put(7, SpeciesKind::Prey, 5.0, 0.0);

        let far = percept(1, SpeciesKind::Predator, 0.0, 0.0);
        machine.execute(&far, &mut steering, &scene.ctx(0.05), &mut rng);
        assert_eq!(machine.state(), BehaviorState::Chase);
        assert_eq!(steering.seek, Some(Vec3::new(5.0, 0.0, 0.0)));

        let close = percept(1, SpeciesKind::Predator, 4.0, 0.0);
        assert!(machine.execute(&close, &mut steering, &scene.ctx(0.05), &mut rng).is_none());
        assert_eq!(machine.state(), BehaviorState::Attack);

        let strike = machine.execute(&close, &mut steering, &scene.ctx(0.05), &mut rng);
        assert_eq!(
            strike,
            Some(Strike {
                attacker: EntityId(1),
                target: EntityId(7)
            })
        );
        // Cooldown holds the next strike back.
        assert!(machine.execute(&close, &mut steering, &scene.ctx(0.5), &mut rng).is_none());
        assert!(machine.execute(&close, &mut steering, &scene.ctx(0.6), &mut rng).is_some());

        scene.kill(7);
        machine.execute(&close, &mut steering, &scene.ctx(0.05), &mut rng);
        assert_eq!(machine.state(), BehaviorState::Idle);
    }

    #[test]
    fn test_attack_falls_back_to_chase_when_target_escapes() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut steering = SteeringSet::default();
        let mut machine = StateMachine::new(&mut steering, &mut rng);
        let mut scene = Scene::new();
        scene.put(7, SpeciesKind::Prey, 1.0, 0.0);
        let me = percept(1, SpeciesKind::Predator, 0.0, 0.0);

        machine.execute(&me, &mut steering, &scene.ctx(0.05), &mut rng);
        machine.execute(&me, &mut steering, &scene.ctx(0.05), &mut rng);
        assert_eq!(machine.state(), BehaviorState::Attack);

        scene.put(7, SpeciesKind::Prey, 4.0, 0.0);
        machine.execute(&me, &mut steering, &scene.ctx(0.05), &mut rng);
        assert_eq!(machine.state(), BehaviorState::Chase);
    }

    #[test]
    fn test_player_target_never_produces_strike() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut steering = SteeringSet::default();
        let mut machine = StateMachine::new(&mut steering, &mut rng);
        let mut scene = Scene::new();
        scene.put(99, SpeciesKind::Player, 0.5, 0.0);
        let me = percept(1, SpeciesKind::Predator, 0.0, 0.0);

        for _ in 0..10 {
            assert!(machine.execute(&me, &mut steering, &scene.ctx(0.5), &mut rng).is_none());
        }
        assert_eq!(machine.state(), BehaviorState::Attack);
    }

    #[test]
    fn test_idle_and_wander_alternate_on_their_dwell_times() {
        let mut rng = SmallRng::seed_from_u64(21);
        let mut steering = SteeringSet::default();
        let mut machine = StateMachine::new(&mut steering, &mut rng);
        let scene = Scene::new();
        let me = percept(1, SpeciesKind::Prey, 0.0, 0.0);
        let dt = 0.05;

        let mut dwells = Vec::new();
        let mut in_state = 0.0;
        for _ in 0..4_000 {
            let before = machine.state();
            let elapsed_before = machine.elapsed();
            machine.execute(&me, &mut steering, &scene.ctx(dt), &mut rng);
            in_state += dt;
            if machine.state() != before {
                assert!((elapsed_before + dt - in_state).abs() < 1e-3);
                assert_eq!(machine.elapsed(), 0.0);
                dwells.push((before, machine.state(), in_state));
                in_state = 0.0;
            }
        }

        let idle: Vec<f32> = dwells
            .iter()
            .filter(|(from, to, _)| *from == BehaviorState::Idle && *to == BehaviorState::Wander)
            .map(|(_, _, t)| *t)
            .collect();
        let wander: Vec<f32> = dwells
            .iter()
            .filter(|(from, to, _)| *from == BehaviorState::Wander && *to == BehaviorState::Idle)
            .map(|(_, _, t)| *t)
            .collect();
        assert_eq!(idle.len() + wander.len(), dwells.len(), "only Idle <-> Wander without company");
        assert!(idle.len() >= 5 && wander.len() >= 5);
        for t in idle {
            assert!((1.0 - 1e-3..=4.0 + dt + 1e-3).contains(&t), "idle dwell {t}");
        }
        for t in wander {
            assert!((3.0 - 1e-3..=7.0 + dt + 1e-3).contains(&t), "wander dwell {t}");
        }
    }

    #[test]
    fn test_chase_gives_up_after_timeout() {
        let mut rng = SmallRng::seed_from_u64(8);
        let mut steering = SteeringSet::default();
        let mut machine = StateMachine::new(&mut steering, &mut rng);
        let mut scene = Scene::new();
        // Always in sight, never in reach.
        scene.put(7, SpeciesKind::Prey, 5.0, 0.0);
        let me = percept(1, SpeciesKind::Predator, 0.0, 0.0);
        let dt = 0.05;

        machine.execute(&me, &mut steering, &scene.ctx(dt), &mut rng);
        assert_eq!(machine.state(), BehaviorState::Chase);

        let mut chased = 0.0;
        while machine.state() == BehaviorState::Chase && chased < 30.0 {
            machine.execute(&me, &mut steering, &scene.ctx(dt), &mut rng);
            chased += dt;
        }
        assert_eq!(machine.state(), BehaviorState::Idle);
        assert!((chased - CHASE_TIMEOUT).abs() <= 0.1, "gave up after {chased}s");
    }

    #[test]
    fn test_chase_drops_target_beyond_twice_awareness() {
        let mut rng = SmallRng::seed_from_u64(13);
        let mut steering = SteeringSet::default();
        let mut machine = StateMachine::new(&mut steering, &mut rng);
        let mut scene = Scene::new();
        scene.put(7, SpeciesKind::Prey, 5.0, 0.0);
        let me = percept(1, SpeciesKind::Predator, 0.0, 0.0);

        machine.execute(&me, &mut steering, &scene.ctx(0.05), &mut rng);
        assert_eq!(machine.state(), BehaviorState::Chase);

        // Out of awareness but still inside twice of it: keep chasing.
        scene.put(7, SpeciesKind::Prey, 19.0, 0.0);
        machine.execute(&me, &mut steering, &scene.ctx(0.05), &mut rng);
        assert_eq!(machine.state(), BehaviorState::Chase);
        assert_eq!(steering.seek, Some(Vec3::new(19.0, 0.0, 0.0)));

        scene.put(7, SpeciesKind::Prey, 21.0, 0.0);
        machine.execute(&me, &mut steering, &scene.ctx(0.05), &mut rng);
        assert_eq!(machine.state(), BehaviorState::Idle);
        assert!(steering.seek.is_none());
        assert_eq!(machine.focus(), None);
    }

    #[test]
    fn test_random_runs_only_take_authorised_transitions() {
        let mut rng = SmallRng::seed_from_u64(42);
        let kinds = [SpeciesKind::Prey, SpeciesKind::Predator];
        for kind in kinds {
            let mut steering = SteeringSet::default();
            let mut machine = StateMachine::new(&mut steering, &mut rng);
            let mut scene = Scene::new();
            for step in 0..2_000 {
                let other = rng.gen_range(-30.0..30.0);
                let other_kind = if rng.gen_bool(0.5) {
                    SpeciesKind::Predator
                } else {
                    SpeciesKind::Prey
                };
                scene.put(2, other_kind, other, 0.0);
                if step % 17 == 0 {
                    scene.kill(2);
                }
                let me = percept(1, kind, 0.0, 0.0);
                let before = machine.state();
                machine.execute(&me, &mut steering, &scene.ctx(0.05 + (step % 7) as f32), &mut rng);
                let after = machine.state();
                assert!(before == after || before.can_transition_to(after), "{before:?} -> {after:?}");
            }
        }
    }
}
