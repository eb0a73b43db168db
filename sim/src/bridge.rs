//! Flat render buffer.
//!
//! Converts a `Snapshot` into a contiguous `Vec<f32>` for consumers that
//! want fixed-stride data instead of JSON.
//!
//! # Buffer Layout (Version 1)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ HEADER (2 elements)                                             │
//! │ [0] layout version                                              │
//! │ [1] agent_count                                                 │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ For each agent i (offset = HEADER_SIZE + i * AGENT_STRIDE):     │
//! │   [+0]  id        - Entity id (u64 as f32)                      │
//! │   [+1]  x                                                       │
//! │   [+2]  y                                                       │
//! │   [+3]  z                                                       │
//! │   [+4]  vx                                                      │
//! │   [+5]  vz                                                      │
//! │   [+6]  heading   - Yaw in radians                              │
//! │   [+7]  kind      - See KIND_* constants                        │
//! │   [+8]  state     - See `state_to_id`                           │
//! │   [+9]  health    - Fraction of max, 0..1                       │
//! │   [+10] stamina   - Fraction of max, 0..1                       │
//! │   [+11] is_alive  - 1.0 alive, 0.0 dead                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Agents keep the snapshot's order (ascending id), so the same snapshot
//! always produces the same buffer.

use crate::components::{SpeciesKind, SpeciesState};
use crate::world::Snapshot;

/// Bumped whenever the layout below changes.
pub const LAYOUT_VERSION: f32 = 1.0;

/// Number of f32 values per agent.
pub const AGENT_STRIDE: usize = 12;

/// Version and agent count.
pub const HEADER_SIZE: usize = 2;

pub const KIND_PREDATOR: f32 = 0.0;
pub const KIND_PREY: f32 = 1.0;
pub const KIND_PLAYER: f32 = 2.0;

pub const FIELD_ID: usize = 0;
pub const FIELD_X: usize = 1;
pub const FIELD_Y: usize = 2;
pub const FIELD_Z: usize = 3;
pub const FIELD_VX: usize = 4;
pub const FIELD_VZ: usize = 5;
pub const FIELD_HEADING: usize = 6;
pub const FIELD_KIND: usize = 7;
pub const FIELD_STATE: usize = 8;
pub const FIELD_HEALTH: usize = 9;
pub const FIELD_STAMINA: usize = 10;
pub const FIELD_IS_ALIVE: usize = 11;

#[inline]
pub fn kind_to_id(kind: SpeciesKind) -> f32 {
    match kind {
        SpeciesKind::Predator => KIND_PREDATOR,
        SpeciesKind::Prey => KIND_PREY,
        SpeciesKind::Player => KIND_PLAYER,
    }
}

/// Idle 0, Walk 1, Run 2, Flee 3, Chase 4, Attack 5, Dead 6.
#[inline]
pub fn state_to_id(state: SpeciesState) -> f32 {
    match state {
        SpeciesState::Idle => 0.0,
        SpeciesState::Walk => 1.0,
        SpeciesState::Run => 2.0,
        SpeciesState::Flee => 3.0,
        SpeciesState::Chase => 4.0,
        SpeciesState::Attack => 5.0,
        SpeciesState::Dead => 6.0,
    }
}

#[inline]
fn fraction(value: f32, max: f32) -> f32 {
    if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Convert a snapshot to the flat buffer described in the module docs.
pub fn snapshot_to_buffer(snapshot: &Snapshot) -> Vec<f32> {
    let count = snapshot.agents.len();
    let size = calculate_buffer_size(count);
    let mut buffer = Vec::with_capacity(size);

    buffer.push(LAYOUT_VERSION);
    buffer.push(count as f32);

    for agent in &snapshot.agents {
        buffer.push(agent.id.0 as f32);
        buffer.push(agent.x);
        buffer.push(agent.y);
        buffer.push(agent.z);
        buffer.push(agent.vx);
        buffer.push(agent.vz);
        buffer.push(agent.heading);
        buffer.push(kind_to_id(agent.kind));
        buffer.push(state_to_id(agent.state));
        buffer.push(fraction(agent.health, agent.health_max));
        buffer.push(fraction(agent.stamina, agent.stamina_max));
        let alive = agent.state != SpeciesState::Dead && agent.health > 0.0;
        buffer.push(if alive { 1.0 } else { 0.0 });
    }

    debug_assert_eq!(buffer.len(), size, "Buffer size mismatch");
    buffer
}

#[inline]
pub fn calculate_buffer_size(agent_count: usize) -> usize {
    HEADER_SIZE + agent_count * AGENT_STRIDE
}

/// Agent count from a buffer, or `None` if the header is missing or the
/// version is unknown.
pub fn parse_agent_count(buffer: &[f32]) -> Option<usize> {
    match buffer {
        [version, count, ..] if *version == LAYOUT_VERSION => Some(*count as usize),
        _ => None,
    }
}

#[inline]
pub const fn agent_offset(index: usize) -> usize {
    HEADER_SIZE + index * AGENT_STRIDE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SimWorld;
    use crate::config::SimConfig;
    use glam::Vec3;

    #[test]
    fn test_buffer_layout() {
        let mut sim = SimWorld::new();
        sim.set_observer(Vec3::new(1.0, 0.0, 2.0), Vec3::ZERO);
        let wolf = sim.spawn_species("wolf", Vec3::new(10.0, 0.0, 20.0)).unwrap();

        let buffer = sim.render_buffer();
        assert_eq!(parse_agent_count(&buffer), Some(2));
        assert_eq!(buffer.len(), calculate_buffer_size(2));

        let player = agent_offset(0);
        assert_eq!(buffer[player + FIELD_KIND], KIND_PLAYER);
        assert_eq!(buffer[player + FIELD_X], 1.0);
        assert_eq!(buffer[player + FIELD_Z], 2.0);
        assert_eq!(buffer[player + FIELD_HEALTH], 1.0);

        let offset = agent_offset(1);
        assert_eq!(buffer[offset + FIELD_ID], wolf.0 as f32);
        assert_eq!(buffer[offset + FIELD_KIND], KIND_PREDATOR);
        assert_eq!(buffer[offset + FIELD_IS_ALIVE], 1.0);
    }

    #[test]
    fn test_buffer_is_deterministic() {
        let config = SimConfig {
            seed: 11,
            ..Default::default()
        };
        let mut a = SimWorld::with_config(config.clone());
        let mut b = SimWorld::with_config(config);
        for _ in 0..40 {
            a.step(0.05);
            b.step(0.05);
        }
        assert_eq!(a.render_buffer(), b.render_buffer());
    }

    #[test]
    fn test_fractions_stay_in_range_after_simulation() {
        let mut sim = SimWorld::new();
        for _ in 0..100 {
            sim.step(0.05);
        }
        let buffer = sim.render_buffer();
        let count = parse_agent_count(&buffer).unwrap();
        for i in 0..count {
            let offset = agent_offset(i);
            for field in [FIELD_HEALTH, FIELD_STAMINA] {
                let value = buffer[offset + field];
                assert!((0.0..=1.0).contains(&value));
            }
        }
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        assert_eq!(parse_agent_count(&[]), None);
        assert_eq!(parse_agent_count(&[2.0, 5.0]), None);
        assert_eq!(parse_agent_count(&[LAYOUT_VERSION, 0.0]), Some(0));
    }

    #[test]
    fn test_field_offsets_fit_stride() {
        assert_eq!(AGENT_STRIDE, FIELD_IS_ALIVE + 1);
        assert_eq!(state_to_id(SpeciesState::Dead), 6.0);
    }
}
