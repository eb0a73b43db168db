//! Steering behaviours for physically simulated agents.
//!
//! Each behaviour produces a force on the x/z plane. Active behaviours are
//! weighted, summed, truncated to the vehicle's max force and integrated
//! into a velocity that is clamped to the caller's speed cap.

use glam::Vec3;
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// Below this speed the heading is left alone to avoid jitter.
pub const FACING_EPSILON: f32 = 0.05;

/// Fraction of velocity bled off per second when no force acts.
const DRAG: f32 = 1.5;

/// Physically simulated body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vehicle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Yaw in radians, measured from +z toward +x.
    pub heading: f32,
    pub max_speed: f32,
    pub max_force: f32,
    pub mass: f32,
    /// Heading change limit in radians per second. Infinite snaps the
    /// heading straight to the velocity direction.
    pub turn_rate: f32,
}

impl Vehicle {
    pub fn new(position: Vec3, max_speed: f32) -> Self {
        let max_speed = if max_speed.is_finite() { max_speed.max(0.0) } else { 0.0 };
        Self {
            position,
            velocity: Vec3::ZERO,
            heading: 0.0,
            max_speed,
            max_force: max_speed * 4.0,
            mass: 1.0,
            turn_rate: f32::INFINITY,
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Wander,
    Seek,
    Flee,
    Arrive,
    Separation,
}

/// Wander circle parameters plus the current drift angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wander {
    pub radius: f32,
    pub distance: f32,
    /// Maximum angle change per second.
    pub jitter: f32,
    pub angle: f32,
}

impl Default for Wander {
    fn default() -> Self {
        Self {
            radius: 2.0,
            distance: 4.0,
            jitter: 3.0,
            angle: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringWeights {
    pub wander: f32,
    pub seek: f32,
    pub flee: f32,
    pub arrive: f32,
    pub separation: f32,
}

impl Default for SteeringWeights {
    fn default() -> Self {
        Self {
            wander: 1.0,
            seek: 1.0,
            flee: 2.0,
            arrive: 1.0,
            separation: 1.5,
        }
    }
}

/// The behaviours currently driving one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct SteeringSet {
    pub wander: Wander,
    pub wander_on: bool,
    pub seek: Option<Vec3>,
    pub flee: Option<Vec3>,
    pub arrive: Option<Vec3>,
    pub separation: bool,
    pub separation_radius: f32,
    /// Distance at which Arrive starts braking.
    pub arrive_radius: f32,
    pub weights: SteeringWeights,
}

impl Default for SteeringSet {
    fn default() -> Self {
        Self {
            wander: Wander::default(),
            wander_on: false,
            seek: None,
            flee: None,
            arrive: None,
            separation: false,
            separation_radius: 3.0,
            arrive_radius: 2.0,
            weights: SteeringWeights::default(),
        }
    }
}

impl SteeringSet {
    /// Switch every behaviour off. Parameters and the wander angle survive.
    pub fn clear(&mut self) {
        self.wander_on = false;
        self.seek = None;
        self.flee = None;
        self.arrive = None;
        self.separation = false;
    }

    pub fn active_behaviors(&self) -> Vec<Behavior> {
        let mut active = Vec::new();
        if self.wander_on {
            active.push(Behavior::Wander);
        }
        if self.seek.is_some() {
            active.push(Behavior::Seek);
        }
        if self.flee.is_some() {
            active.push(Behavior::Flee);
        }
        if self.arrive.is_some() {
            active.push(Behavior::Arrive);
        }
        if self.separation {
            active.push(Behavior::Separation);
        }
        active
    }

    /// Weighted sum of active behaviours, truncated to `max_force`.
    pub fn calculate<R: Rng>(
        &mut self,
        vehicle: &Vehicle,
        neighbors: &[Vec3],
        rng: &mut R,
        dt: f32,
    ) -> Vec3 {
        let w = self.weights;
        let mut force = Vec3::ZERO;

        if self.wander_on {
            force += wander(vehicle, &mut self.wander, rng, dt) * w.wander;
        }
        if let Some(target) = self.seek {
            force += seek(vehicle, target) * w.seek;
        }
        if let Some(threat) = self.flee {
            force += flee(vehicle, threat) * w.flee;
        }
        if let Some(target) = self.arrive {
            force += arrive(vehicle, target, self.arrive_radius) * w.arrive;
        }
        if self.separation {
            force += separation(vehicle, neighbors, self.separation_radius) * w.separation;
        }

        truncate(planar(force), vehicle.max_force)
    }
}

pub fn seek(vehicle: &Vehicle, target: Vec3) -> Vec3 {
    let desired = planar(target - vehicle.position).normalize_or_zero() * vehicle.max_speed;
    desired - planar(vehicle.velocity)
}

pub fn flee(vehicle: &Vehicle, threat: Vec3) -> Vec3 {
    let away = planar(vehicle.position - threat);
    // Standing on top of the threat: pick any direction rather than none.
    let direction = if away.length_squared() < 1e-6 { Vec3::X } else { away.normalize() };
    direction * vehicle.max_speed - planar(vehicle.velocity)
}

pub fn arrive(vehicle: &Vehicle, target: Vec3, slowing_radius: f32) -> Vec3 {
    let to_target = planar(target - vehicle.position);
    let distance = to_target.length();
    if distance < 1e-3 {
        return -planar(vehicle.velocity);
    }
    let ramp = if slowing_radius > 0.0 {
        (distance / slowing_radius).min(1.0)
    } else {
        1.0
    };
    let desired = to_target / distance * vehicle.max_speed * ramp;
    desired - planar(vehicle.velocity)
}

/// Random drift: a target on a circle ahead of the vehicle, nudged a little
/// each step.
pub fn wander<R: Rng>(vehicle: &Vehicle, params: &mut Wander, rng: &mut R, dt: f32) -> Vec3 {
    let jitter = params.jitter * dt.max(0.0);
    if jitter > 0.0 {
        params.angle += rng.gen_range(-jitter..=jitter);
    }
    let forward = Vec3::new(vehicle.heading.sin(), 0.0, vehicle.heading.cos());
    let center = vehicle.position + forward * params.distance;
    let offset = Vec3::new(params.angle.sin(), 0.0, params.angle.cos()) * params.radius;
    seek(vehicle, center + offset)
}

/// Push away from neighbours inside `radius`, stronger when closer.
pub fn separation(vehicle: &Vehicle, neighbors: &[Vec3], radius: f32) -> Vec3 {
    let mut push = Vec3::ZERO;
    let mut count = 0;
    for other in neighbors {
        let away = planar(vehicle.position - *other);
        let distance = away.length();
        if distance > 1e-3 && distance < radius {
            push += away / distance * (1.0 - distance / radius);
            count += 1;
        }
    }
    if count == 0 {
        return Vec3::ZERO;
    }
    (push / count as f32) * vehicle.max_speed
}

/// Advance the vehicle one step. The resulting speed never exceeds
/// `speed_cap`; heading follows velocity only above `FACING_EPSILON`.
pub fn integrate(vehicle: &mut Vehicle, force: Vec3, dt: f32, speed_cap: f32) {
    if !dt.is_finite() || dt <= 0.0 {
        return;
    }
    let cap = if speed_cap.is_finite() { speed_cap.max(0.0) } else { 0.0 };
    let acceleration = if force.is_finite() {
        planar(force) / vehicle.mass.max(f32::EPSILON)
    } else {
        Vec3::ZERO
    };

    let damping = (1.0 - DRAG * dt).clamp(0.0, 1.0);
    let mut velocity = planar(vehicle.velocity) * damping + acceleration * dt;
    if !velocity.is_finite() {
        velocity = Vec3::ZERO;
    }
    vehicle.velocity = truncate(velocity, cap);
    vehicle.position += vehicle.velocity * dt;

    if vehicle.velocity.length_squared() > FACING_EPSILON * FACING_EPSILON {
        let desired = vehicle.velocity.x.atan2(vehicle.velocity.z);
        let max_turn = if vehicle.turn_rate.is_finite() {
            vehicle.turn_rate.max(0.0) * dt
        } else {
            f32::INFINITY
        };
        let turn = wrap_angle(desired - vehicle.heading).clamp(-max_turn, max_turn);
        vehicle.heading = wrap_angle(vehicle.heading + turn);
    }
}

/// Wrap an angle into `[-PI, PI)`.
#[inline]
fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

#[inline]
fn planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

#[inline]
fn truncate(v: Vec3, max: f32) -> Vec3 {
    v.clamp_length_max(max.max(0.0))
}
