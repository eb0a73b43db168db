//! Spatial partitioning for efficient neighbor queries.
//!
//! Provides O(1) cell lookup and O(k) neighbor queries where k is the number
//! of entities in nearby cells, rather than O(n) for brute force.
//! Positions outside the play area are clamped into the border cells, so
//! queries stay correct there, only slower.

use crate::components::SpeciesKind;
use crate::store::EntityId;
use bevy_ecs::prelude::*;
use std::collections::HashMap;

/// Grid-based spatial partitioning over the x/z plane.
#[derive(Resource, Debug)]
pub struct SpatialGrid {
    /// Cell size in world units.
    pub cell_size: f32,
    /// Half the side length of the square play area, centred on the origin.
    half_extent: f32,
    cells: HashMap<(i32, i32), Vec<SpatialEntry>>,
    /// Reverse lookup: entity to cell.
    entity_cells: HashMap<EntityId, (i32, i32)>,
}

/// Entry in a spatial cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    pub id: EntityId,
    pub x: f32,
    pub z: f32,
    pub kind: SpeciesKind,
}

impl SpatialEntry {
    fn distance_sq(&self, x: f32, z: f32) -> f32 {
        (self.x - x).powi(2) + (self.z - z).powi(2)
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(16.0, 512.0)
    }
}

impl SpatialGrid {
    pub fn new(cell_size: f32, half_extent: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 { cell_size } else { 16.0 };
        Self {
            cell_size,
            half_extent: half_extent.abs().max(cell_size),
            cells: HashMap::new(),
            entity_cells: HashMap::new(),
        }
    }

    /// Convert world coordinates to (clamped) cell coordinates.
    #[inline]
    pub fn world_to_cell(&self, x: f32, z: f32) -> (i32, i32) {
        let limit = (self.half_extent / self.cell_size).ceil() as i32;
        (
            ((x / self.cell_size).floor() as i32).clamp(-limit, limit),
            ((z / self.cell_size).floor() as i32).clamp(-limit, limit),
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.entity_cells.clear();
    }

    /// Insert or move an entity.
    pub fn insert(&mut self, id: EntityId, x: f32, z: f32, kind: SpeciesKind) {
        if !x.is_finite() || !z.is_finite() {
            self.remove(id);
            return;
        }
        let cell = self.world_to_cell(x, z);

        if let Some(old_cell) = self.entity_cells.insert(id, cell) {
            if let Some(entries) = self.cells.get_mut(&old_cell) {
                entries.retain(|e| e.id != id);
            }
        }
        self.cells.entry(cell).or_default().push(SpatialEntry { id, x, z, kind });
    }

    pub fn remove(&mut self, id: EntityId) {
        if let Some(cell) = self.entity_cells.remove(&id) {
            if let Some(entries) = self.cells.get_mut(&cell) {
                entries.retain(|e| e.id != id);
            }
        }
    }

    /// All entries within `radius` of a point, closest first.
    pub fn query_radius(&self, x: f32, z: f32, radius: f32) -> Vec<SpatialEntry> {
        if !radius.is_finite() || radius < 0.0 || !x.is_finite() || !z.is_finite() {
            return Vec::new();
        }
        let radius_sq = radius * radius;
        let cells_to_check = (radius / self.cell_size).ceil() as i32 + 1;
        let center_cell = self.world_to_cell(x, z);

        let mut results: Vec<SpatialEntry> = Vec::new();
        for dx in -cells_to_check..=cells_to_check {
            for dz in -cells_to_check..=cells_to_check {
                let cell = (center_cell.0 + dx, center_cell.1 + dz);
                if let Some(entries) = self.cells.get(&cell) {
                    results.extend(entries.iter().filter(|e| e.distance_sq(x, z) <= radius_sq));
                }
            }
        }

        results.sort_by(|a, b| {
            a.distance_sq(x, z)
                .partial_cmp(&b.distance_sq(x, z))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        results
    }

    /// Nearest entry of one of `kinds` within `radius`, skipping `exclude`.
    pub fn nearest_of_kind(
        &self,
        x: f32,
        z: f32,
        radius: f32,
        kinds: &[SpeciesKind],
        exclude: EntityId,
    ) -> Option<SpatialEntry> {
        self.query_radius(x, z, radius)
            .into_iter()
            .find(|e| e.id != exclude && kinds.contains(&e.kind))
    }

    /// Whether anything other than `exclude` sits within `radius`.
    pub fn any_within(&self, x: f32, z: f32, radius: f32, exclude: Option<EntityId>) -> bool {
        self.query_radius(x, z, radius)
            .iter()
            .any(|e| Some(e.id) != exclude)
    }

    pub fn total_count(&self) -> usize {
        self.entity_cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_grid_insert_query() {
        let mut grid = SpatialGrid::new(10.0, 200.0);

        grid.insert(EntityId(1), 5.0, 5.0, SpeciesKind::Prey);
        grid.insert(EntityId(2), 15.0, 5.0, SpeciesKind::Prey);
        grid.insert(EntityId(3), 100.0, 100.0, SpeciesKind::Predator);

        assert_eq!(grid.query_radius(5.0, 5.0, 15.0).len(), 2);
        assert_eq!(grid.query_radius(5.0, 5.0, 5.0).len(), 1);
        assert_eq!(grid.query_radius(100.0, 100.0, 10.0).len(), 1);
    }

    #[test]
    fn test_reinsert_moves_without_duplicates() {
        let mut grid = SpatialGrid::new(10.0, 200.0);
        grid.insert(EntityId(1), 1.0, 1.0, SpeciesKind::Prey);
        grid.insert(EntityId(1), 2.0, 2.0, SpeciesKind::Prey);
        grid.insert(EntityId(1), 55.0, 2.0, SpeciesKind::Prey);

        assert_eq!(grid.total_count(), 1);
        assert!(grid.query_radius(1.0, 1.0, 5.0).is_empty());
        assert_eq!(grid.query_radius(55.0, 2.0, 1.0).len(), 1);
    }

    #[test]
    fn test_nearest_of_kind() {
        let mut grid = SpatialGrid::new(10.0, 200.0);
        grid.insert(EntityId(1), 0.0, 0.0, SpeciesKind::Prey);
        grid.insert(EntityId(2), 30.0, 0.0, SpeciesKind::Predator);
        grid.insert(EntityId(3), 20.0, 0.0, SpeciesKind::Predator);
        grid.insert(EntityId(4), 2.0, 0.0, SpeciesKind::Prey);

        let nearest = grid.nearest_of_kind(0.0, 0.0, 50.0, &[SpeciesKind::Predator], EntityId(1));
        assert_eq!(nearest.map(|e| e.id), Some(EntityId(3)));

        let nearest_prey = grid.nearest_of_kind(0.0, 0.0, 50.0, &[SpeciesKind::Prey], EntityId(1));
        assert_eq!(nearest_prey.map(|e| e.id), Some(EntityId(4)));
    }

    #[test]
    fn test_out_of_bounds_positions_are_tolerated() {
        let mut grid = SpatialGrid::new(10.0, 50.0);
        grid.insert(EntityId(1), 5_000.0, -9_000.0, SpeciesKind::Prey);
        grid.insert(EntityId(2), 5_003.0, -9_000.0, SpeciesKind::Prey);
        grid.insert(EntityId(3), f32::NAN, 0.0, SpeciesKind::Prey);

        assert_eq!(grid.total_count(), 2);
        assert_eq!(grid.query_radius(5_000.0, -9_000.0, 5.0).len(), 2);
        // Clamped into the same border cell but still filtered by true distance.
        assert_eq!(grid.query_radius(5_000.0, -9_000.0, 1.0).len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut grid = SpatialGrid::new(10.0, 200.0);
        grid.insert(EntityId(1), 0.0, 0.0, SpeciesKind::Prey);
        grid.remove(EntityId(1));
        grid.remove(EntityId(1));
        assert_eq!(grid.total_count(), 0);
        assert!(!grid.any_within(0.0, 0.0, 10.0, None));
    }
}
