//! Entity store with stable ids.
//!
//! `bevy_ecs` recycles `Entity` handles, so every simulation entity also
//! carries an `EntityId` drawn from a monotonically increasing counter.
//! The `EntityIndex` resource maps ids back to live handles; anything that
//! spawns or despawns goes through it.

use crate::registry::AgentRegistry;
use bevy_ecs::prelude::*;
use bevy_ecs::query::QueryFilter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable, never reused entity identifier.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Id allocator and id -> handle lookup.
#[derive(Resource, Debug, Default)]
pub struct EntityIndex {
    next: u64,
    entities: HashMap<EntityId, Entity>,
}

impl EntityIndex {
    /// Allocate the next id. Ids start at 1 and are never handed out twice.
    pub fn allocate(&mut self) -> EntityId {
        self.next += 1;
        EntityId(self.next)
    }

    pub fn bind(&mut self, id: EntityId, entity: Entity) {
        self.entities.insert(id, entity);
    }

    pub fn unbind(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn resolve(&self, id: EntityId) -> Option<Entity> {
        self.entities.get(&id).copied()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Forget every binding. The id counter keeps counting.
    fn clear(&mut self) {
        self.entities.clear();
    }
}

/// Spawn a bundle through `Commands`, tagging it with a fresh id.
pub fn spawn_tracked<B: Bundle>(commands: &mut Commands, index: &mut EntityIndex, bundle: B) -> EntityId {
    let id = index.allocate();
    let entity = commands.spawn((id, bundle)).id();
    index.bind(id, entity);
    id
}

/// Despawn through `Commands`. Returns `false` if the id was already gone.
pub fn despawn_tracked(commands: &mut Commands, index: &mut EntityIndex, id: EntityId) -> bool {
    let Some(entity) = index.unbind(id) else {
        return false;
    };
    if let Some(mut entity_commands) = commands.get_entity(entity) {
        entity_commands.despawn();
    }
    true
}

/// Generic entity container over a `bevy_ecs` world.
///
/// Queries hand out live references: mutating what `get_mut` returns
/// mutates the stored component.
pub struct EntityStore {
    world: World,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self::from_world(World::new())
    }

    pub fn from_world(mut world: World) -> Self {
        world.init_resource::<EntityIndex>();
        Self { world }
    }

    /// Add an entity and return its id.
    pub fn add<B: Bundle>(&mut self, bundle: B) -> EntityId {
        let id = self.world.resource_mut::<EntityIndex>().allocate();
        let entity = self.world.spawn((id, bundle)).id();
        self.world.resource_mut::<EntityIndex>().bind(id, entity);
        id
    }

    /// Remove an entity and its agent, if any. Removing twice is a no-op.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.world.resource_mut::<EntityIndex>().unbind(id) else {
            return false;
        };
        if let Some(mut registry) = self.world.get_resource_mut::<AgentRegistry>() {
            registry.unregister(id);
        }
        self.world.despawn(entity)
    }

    pub fn entity(&self, id: EntityId) -> Option<Entity> {
        self.world.resource::<EntityIndex>().resolve(id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entity(id).is_some()
    }

    pub fn get<T: Component>(&self, id: EntityId) -> Option<&T> {
        let entity = self.entity(id)?;
        self.world.get::<T>(entity)
    }

    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> Option<Mut<'_, T>> {
        let entity = self.entity(id)?;
        self.world.get_mut::<T>(entity)
    }

    /// Ids of every entity matching a component-presence filter,
    /// e.g. `store.query::<(With<Species>, With<Transform>)>()`.
    pub fn query<F: QueryFilter>(&mut self) -> Vec<EntityId> {
        let mut state = self.world.query_filtered::<&EntityId, F>();
        let mut ids: Vec<EntityId> = state.iter(&self.world).copied().collect();
        ids.sort();
        ids
    }

    /// Despawn everything. Ids allocated afterwards still never repeat.
    pub fn clear(&mut self) {
        self.world.clear_entities();
        self.world.resource_mut::<EntityIndex>().clear();
        if let Some(mut registry) = self.world.get_resource_mut::<AgentRegistry>() {
            registry.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.world.resource::<EntityIndex>().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
