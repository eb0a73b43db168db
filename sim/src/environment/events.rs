//! Rare, phase-gated world events.

use super::time::DayPhase;
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Retry delay after a candidate's phase precondition fails.
pub const RETRY_SECONDS: f32 = 30.0;
/// Gap between successful scheduling attempts.
pub const CHECK_INTERVAL: (f32, f32) = (240.0, 600.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldEventKind {
    /// Night-only hazard: predators hit harder.
    BloodMoon,
    /// Dusk-only bonus: more experience.
    GoldenHour,
    /// Dawn-only visibility hazard.
    MorningMist,
}

impl WorldEventKind {
    pub const ALL: [WorldEventKind; 3] = [
        WorldEventKind::BloodMoon,
        WorldEventKind::GoldenHour,
        WorldEventKind::MorningMist,
    ];

    pub fn required_phase(self) -> DayPhase {
        match self {
            WorldEventKind::BloodMoon => DayPhase::Night,
            WorldEventKind::GoldenHour => DayPhase::Dusk,
            WorldEventKind::MorningMist => DayPhase::Dawn,
        }
    }

    pub fn duration(self) -> f32 {
        match self {
            WorldEventKind::BloodMoon => 180.0,
            WorldEventKind::GoldenHour => 120.0,
            WorldEventKind::MorningMist => 150.0,
        }
    }

    pub fn modifiers(self) -> EventModifiers {
        match self {
            WorldEventKind::BloodMoon => EventModifiers {
                damage: 1.5,
                ambient: 0.7,
                fog: 0.1,
                experience: 1.25,
                ..EventModifiers::NEUTRAL
            },
            WorldEventKind::GoldenHour => EventModifiers {
                experience: 1.5,
                ambient: 1.2,
                ..EventModifiers::NEUTRAL
            },
            WorldEventKind::MorningMist => EventModifiers {
                fog: 0.4,
                visibility: 0.5,
                ..EventModifiers::NEUTRAL
            },
        }
    }
}

/// Multipliers (and one additive fog term) an active event applies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventModifiers {
    pub damage: f32,
    pub experience: f32,
    pub ambient: f32,
    /// Added to fog density.
    pub fog: f32,
    pub visibility: f32,
}

impl EventModifiers {
    pub const NEUTRAL: EventModifiers = EventModifiers {
        damage: 1.0,
        experience: 1.0,
        ambient: 1.0,
        fog: 0.0,
        visibility: 1.0,
    };

    fn combine(self, other: EventModifiers) -> EventModifiers {
        EventModifiers {
            damage: self.damage * other.damage,
            experience: self.experience * other.experience,
            ambient: self.ambient * other.ambient,
            fog: self.fog + other.fog,
            visibility: self.visibility * other.visibility,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEvent {
    pub kind: WorldEventKind,
    pub started_at: f32,
    pub remaining: f32,
}

/// Started and ended events from one scheduler update.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EventChanges {
    pub started: Vec<WorldEventKind>,
    pub ended: Vec<WorldEventKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEvents {
    pub active: Vec<ActiveEvent>,
    /// Simulation time at which the scheduler next tries an event.
    pub next_check_at: f32,
}

impl Default for WorldEvents {
    fn default() -> Self {
        Self {
            active: Vec::new(),
            next_check_at: CHECK_INTERVAL.0,
        }
    }
}

impl WorldEvents {
    pub fn is_active(&self, kind: WorldEventKind) -> bool {
        self.active.iter().any(|e| e.kind == kind)
    }

    /// Combined modifiers of every active event.
    pub fn modifiers(&self) -> EventModifiers {
        self.active
            .iter()
            .fold(EventModifiers::NEUTRAL, |acc, e| acc.combine(e.kind.modifiers()))
    }

    /// Start `kind` if its phase allows and it is not already running.
    pub fn try_start(&mut self, kind: WorldEventKind, now: f32, phase: DayPhase) -> bool {
        if phase != kind.required_phase() || self.is_active(kind) {
            return false;
        }
        self.active.push(ActiveEvent {
            kind,
            started_at: now,
            remaining: kind.duration(),
        });
        true
    }

    /// Tick active events and run the scheduler.
    pub fn update(&mut self, now: f32, dt: f32, phase: DayPhase, rng: &mut SmallRng) -> EventChanges {
        let mut changes = EventChanges::default();
        if dt.is_finite() && dt > 0.0 {
            for event in &mut self.active {
                event.remaining -= dt;
            }
        }
        self.active.retain(|event| {
            let keep = event.remaining > 0.0;
            if !keep {
                changes.ended.push(event.kind);
            }
            keep
        });

        if now < self.next_check_at {
            return changes;
        }
        let candidate = WorldEventKind::ALL[rng.gen_range(0..WorldEventKind::ALL.len())];
        if self.try_start(candidate, now, phase) {
            changes.started.push(candidate);
            self.next_check_at = now + rng.gen_range(CHECK_INTERVAL.0..=CHECK_INTERVAL.1);
        } else {
            // Wrong phase for this candidate; try again soon instead of
            // waiting out a full interval.
            self.next_check_at = now + RETRY_SECONDS;
        }
        changes
    }
}
