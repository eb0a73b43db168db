//! ECS Components for the Untamed simulation.
//!
//! Components are pure data containers attached to entities. Entities are
//! sparse: a resource node has no `Species`, the observer has no `Combat`.
//! Systems query by component presence and skip whatever is missing.

use crate::store::EntityId;
use bevy_ecs::prelude::*;
use glam::Vec3;
use serde::{Deserialize, Serialize};

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// Placement in the world. The simulation plane is x/z; y is height.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    /// Yaw in radians, measured from +z toward +x.
    pub rotation: f32,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: 0.0,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Squared distance on the x/z plane.
    pub fn planar_distance_sq(&self, other: Vec3) -> f32 {
        planar_distance_sq(self.position, other)
    }
}

/// Squared distance between two points on the x/z plane.
#[inline]
pub fn planar_distance_sq(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz
}

/// Kinematic state mirrored from the physics agent.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub max_speed: f32,
    /// How fast the heading may follow velocity, in radians per second.
    pub turn_rate: f32,
}

impl Default for Movement {
    fn default() -> Self {
        Self::new(4.0)
    }
}

impl Movement {
    pub fn new(max_speed: f32) -> Self {
        Self {
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            max_speed: max_speed.max(0.0),
            turn_rate: std::f32::consts::PI,
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

// ============================================================================
// SPECIES COMPONENTS
// ============================================================================

/// Ecological role of a species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeciesKind {
    Predator,
    Prey,
    Player,
}

/// Behavioural state as seen by the rest of the game.
///
/// `Dead` is terminal: once set, no other state can be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeciesState {
    #[default]
    Idle,
    Walk,
    Run,
    Flee,
    Chase,
    Attack,
    Dead,
}

/// Living creature stats. Health and stamina are always kept inside
/// `[0, max]`; every write path clamps.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    /// Template id from the species table (e.g. "wolf").
    pub id: String,
    pub name: String,
    pub kind: SpeciesKind,
    health: f32,
    max_health: f32,
    stamina: f32,
    max_stamina: f32,
    /// Base movement speed (units per second).
    pub speed: f32,
    state: SpeciesState,
}

impl Species {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: SpeciesKind,
        max_health: f32,
        max_stamina: f32,
        speed: f32,
    ) -> Self {
        let max_health = sanitize_max(max_health);
        let max_stamina = sanitize_max(max_stamina);
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            health: max_health,
            max_health,
            stamina: max_stamina,
            max_stamina,
            speed: speed.max(0.0),
            state: SpeciesState::Idle,
        }
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn stamina(&self) -> f32 {
        self.stamina
    }

    pub fn max_stamina(&self) -> f32 {
        self.max_stamina
    }

    pub fn state(&self) -> SpeciesState {
        self.state
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }

    pub fn stamina_fraction(&self) -> f32 {
        if self.max_stamina <= 0.0 {
            0.0
        } else {
            (self.stamina / self.max_stamina).clamp(0.0, 1.0)
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state != SpeciesState::Dead && self.health > 0.0
    }

    pub fn is_exhausted(&self) -> bool {
        self.stamina <= 0.0
    }

    /// Apply damage. Returns `true` only for the call that kills.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if !self.is_alive() || !amount.is_finite() || amount <= 0.0 {
            return false;
        }
        self.health = (self.health - amount).clamp(0.0, self.max_health);
        if self.health <= 0.0 {
            self.state = SpeciesState::Dead;
            return true;
        }
        false
    }

    pub fn heal(&mut self, amount: f32) {
        if !self.is_alive() || !amount.is_finite() || amount <= 0.0 {
            return;
        }
        self.health = (self.health + amount).clamp(0.0, self.max_health);
    }

    pub fn restore_stamina(&mut self, amount: f32) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }
        self.stamina = (self.stamina + amount).clamp(0.0, self.max_stamina);
    }

    pub fn drain_stamina(&mut self, amount: f32) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }
        self.stamina = (self.stamina - amount).clamp(0.0, self.max_stamina);
    }

    /// Write a state. Refused once the creature is dead.
    pub fn set_state(&mut self, state: SpeciesState) -> bool {
        if self.state == SpeciesState::Dead {
            return false;
        }
        if state == SpeciesState::Dead {
            return self.kill();
        }
        self.state = state;
        true
    }

    /// Mark as dead. Returns `true` only on the first call.
    pub fn kill(&mut self) -> bool {
        if self.state == SpeciesState::Dead {
            return false;
        }
        self.health = 0.0;
        self.state = SpeciesState::Dead;
        true
    }
}

fn sanitize_max(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

// ============================================================================
// COMBAT COMPONENTS
// ============================================================================

/// Melee capabilities.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Combat {
    pub damage: f32,
    pub attack_range: f32,
    /// Attacks per second.
    pub attack_speed: f32,
    /// Simulation time of the last landed attack.
    pub last_attack_time: Option<f32>,
}

impl Default for Combat {
    fn default() -> Self {
        Self {
            damage: 8.0,
            attack_range: 1.5,
            attack_speed: 1.0,
            last_attack_time: None,
        }
    }
}

impl Combat {
    pub fn cooldown(&self) -> f32 {
        if self.attack_speed > 0.0 {
            1.0 / self.attack_speed
        } else {
            f32::INFINITY
        }
    }

    pub fn ready(&self, now: f32) -> bool {
        match self.last_attack_time {
            None => self.attack_speed > 0.0,
            Some(last) => now - last >= self.cooldown(),
        }
    }
}

/// Perception and wander bookkeeping mirrored from the agent.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Steering {
    /// Weak reference; may point at an entity that no longer exists.
    pub target: Option<EntityId>,
    pub awareness_radius: f32,
    pub wander_heading: f32,
    pub wander_timer: f32,
}

impl Default for Steering {
    fn default() -> Self {
        Self {
            target: None,
            awareness_radius: 12.0,
            wander_heading: 0.0,
            wander_timer: 0.0,
        }
    }
}

impl Steering {
    pub fn with_awareness(awareness_radius: f32) -> Self {
        Self {
            awareness_radius: awareness_radius.max(0.0),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyEffectKind {
    /// Damage multiplied by `value` while below half health.
    Rage,
    /// Splits into `value` offspring on death.
    Split,
    /// Hits slow the observer to `value` of normal speed.
    Curse,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyEffect {
    pub kind: EnemyEffectKind,
    pub active: bool,
    pub value: f32,
}

impl EnemyEffect {
    pub fn new(kind: EnemyEffectKind, value: f32) -> Self {
        // Rage switches on at low health; the others are armed from birth.
        let active = !matches!(kind, EnemyEffectKind::Rage);
        Self {
            kind,
            active,
            value,
        }
    }

    /// Outgoing damage multiplier contributed by this effect.
    pub fn damage_multiplier(&self) -> f32 {
        match self.kind {
            EnemyEffectKind::Rage if self.active => self.value.max(1.0),
            _ => 1.0,
        }
    }
}

/// Damage multiplier for an optional effect.
pub fn effect_damage_multiplier(effect: Option<&EnemyEffect>) -> f32 {
    effect.map(EnemyEffect::damage_multiplier).unwrap_or(1.0)
}

/// Movement-slowing debuff on the observer. One instance per target;
/// repeated hits refresh it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlowDebuff {
    pub remaining: f32,
    /// Speed multiplier while active, in `(0, 1]`.
    pub factor: f32,
}

impl SlowDebuff {
    pub fn new(duration: f32, factor: f32) -> Self {
        Self {
            remaining: duration.max(0.0),
            factor: factor.clamp(0.05, 1.0),
        }
    }

    pub fn refresh(&mut self, duration: f32, factor: f32) {
        self.remaining = duration.max(0.0);
        self.factor = self.factor.min(factor.clamp(0.05, 1.0));
    }
}

// ============================================================================
// RESOURCE COMPONENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Berries,
    Herb,
    Mushroom,
    Spring,
}

/// Restore amounts handed out by a successful collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Restore {
    pub health: f32,
    pub stamina: f32,
}

/// A collectable node. Toggled collected/uncollected instead of despawned.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub kind: ResourceKind,
    pub health_restore: f32,
    pub stamina_restore: f32,
    pub collected: bool,
    pub collected_at: Option<f32>,
    /// Seconds until a collected node becomes available again.
    pub respawn_time: f32,
}

impl ResourceNode {
    pub fn new(kind: ResourceKind, health_restore: f32, stamina_restore: f32, respawn_time: f32) -> Self {
        Self {
            kind,
            health_restore: health_restore.max(0.0),
            stamina_restore: stamina_restore.max(0.0),
            collected: false,
            collected_at: None,
            respawn_time: respawn_time.max(0.0),
        }
    }

    /// Collect the node. `None` if it is already collected.
    pub fn collect(&mut self, now: f32) -> Option<Restore> {
        if self.collected {
            return None;
        }
        self.collected = true;
        self.collected_at = Some(now);
        Some(Restore {
            health: self.health_restore,
            stamina: self.stamina_restore,
        })
    }

    /// Make a collected node available again once its respawn time elapsed.
    pub fn try_respawn(&mut self, now: f32) -> bool {
        match (self.collected, self.collected_at) {
            (true, Some(at)) if now - at >= self.respawn_time => {
                self.collected = false;
                self.collected_at = None;
                true
            }
            _ => false,
        }
    }
}

// ============================================================================
// MARKERS
// ============================================================================

/// The externally controlled observer.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

/// A death whose reward was already paid out.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct RewardClaimed;

// ============================================================================
// BUNDLE HELPERS
// ============================================================================

/// Bundle for an autonomous creature.
#[derive(Bundle)]
pub struct CreatureBundle {
    pub transform: Transform,
    pub movement: Movement,
    pub species: Species,
    pub combat: Combat,
    pub steering: Steering,
}

/// Bundle for the observer.
#[derive(Bundle)]
pub struct PlayerBundle {
    pub marker: Player,
    pub transform: Transform,
    pub movement: Movement,
    pub species: Species,
}

impl PlayerBundle {
    pub fn new(position: Vec3) -> Self {
        Self {
            marker: Player,
            transform: Transform::at(position),
            movement: Movement::new(6.0),
            species: Species::new("player", "Wanderer", SpeciesKind::Player, 100.0, 100.0, 6.0),
        }
    }
}

/// Bundle for a collectable node.
#[derive(Bundle)]
pub struct ResourceBundle {
    pub transform: Transform,
    pub node: ResourceNode,
}
