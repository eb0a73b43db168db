//! Outbound notices for quest, achievement and stat collaborators.

use crate::components::{SpeciesKind, SpeciesState};
use crate::environment::{BiomeKind, WeatherKind, WorldEventKind};
use crate::store::EntityId;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Oldest notices are dropped beyond this many undrained entries.
pub const OUTBOX_CAPACITY: usize = 4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    NewDay { day: u32 },
    WeatherChanged { from: WeatherKind, to: WeatherKind },
    BiomeChanged { from: BiomeKind, to: BiomeKind },
    WorldEventStarted { event: WorldEventKind },
    WorldEventEnded { event: WorldEventKind },
    StateChanged { id: EntityId, from: SpeciesState, to: SpeciesState },
    EntityDied { id: EntityId, species: String, kind: SpeciesKind },
    PlayerDied { killer: Option<EntityId> },
    ExperienceAwarded { amount: f32, source: EntityId },
    CurrencyAwarded { amount: u32, source: EntityId },
    ResourceCollected { id: EntityId, health: f32, stamina: f32 },
}

#[derive(Resource, Debug, Default)]
pub struct Outbox {
    notices: VecDeque<Notice>,
}

impl Outbox {
    pub fn push(&mut self, notice: Notice) {
        if self.notices.len() >= OUTBOX_CAPACITY {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }
}

/// Running totals mirrored for read-only exposure. Durable ownership of
/// these values lives with the external stat stores.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub experience: f32,
    pub currency: u32,
    pub kills: u32,
    pub resources_collected: u32,
}
