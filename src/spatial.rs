//! Spatial partitioning for efficient neighbor queries.
//!
//! Provides O(1) cell lookup and O(k) neighbor queries where k is the number
//! of tanks in nearby cells, rather than O(n) for brute force.
//!
//! The grid is a fixed `size_x * size_y` array of cells covering the field
//! from the origin. It is rebuilt from scratch at the start of every frame,
//! so the entries it hands out are a frame-stable snapshot: passes that run
//! later in the frame read the cell lists without locking.
//!
//! Tanks off the field are registered in the nearest border cell. Clamping
//! moves two positions at most as many cells apart as before, so a
//! neighborhood scan around a clamped cell still finds every tank within
//! one cell's reach.

use crate::components::{
    Active, CellCoord, CollisionRadius, Faction, GridCell, Position, Tank, TankId,
};
use crate::config::BattleConfig;
use crate::error::{Result, SimError};
use bevy_ecs::prelude::*;
use glam::Vec2;
use tracing::trace;

/// Grid-based spatial partitioning structure.
///
/// Divides the field into cells and tracks which tanks are in each cell.
/// Enables fast neighbor queries by only checking nearby cells.
#[derive(Resource, Debug)]
pub struct SpatialGrid {
    /// Cell size in world units.
    cell_size: f32,
    size_x: i32,
    size_y: i32,
    /// Row-major cells, `size_x * size_y` long.
    cells: Vec<Vec<SpatialEntry>>,
    /// Neighborhood offsets, including (0, 0).
    offsets: Vec<(i32, i32)>,
    len: usize,
}

/// Entry in a spatial cell: an unowned reference to a tank plus a copy of
/// the state it had when the grid was built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    pub entity: Entity,
    pub id: TankId,
    pub position: Vec2,
    pub radius: f32,
    pub faction: Faction,
}

impl SpatialGrid {
    /// Create a grid of `size_x * size_y` cells with a 3x3 neighborhood.
    pub fn new(cell_size: f32, size_x: u32, size_y: u32) -> Result<Self> {
        Self::with_reach(cell_size, size_x, size_y, 1)
    }

    /// Create a grid whose neighborhood extends `reach` cells in every
    /// direction.
    pub fn with_reach(cell_size: f32, size_x: u32, size_y: u32, reach: u32) -> Result<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(SimError::InvalidGrid(format!(
                "cell size must be positive, got {cell_size}"
            )));
        }
        if size_x == 0 || size_y == 0 {
            return Err(SimError::InvalidGrid(format!(
                "grid must have at least one cell, got {size_x}x{size_y}"
            )));
        }
        let (Ok(sx), Ok(sy), Ok(reach)) =
            (i32::try_from(size_x), i32::try_from(size_y), i32::try_from(reach))
        else {
            return Err(SimError::InvalidGrid("grid dimensions overflow".into()));
        };

        let mut offsets = Vec::with_capacity(((2 * reach + 1) * (2 * reach + 1)) as usize);
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                offsets.push((dx, dy));
            }
        }

        Ok(Self {
            cell_size,
            size_x: sx,
            size_y: sy,
            cells: vec![Vec::new(); size_x as usize * size_y as usize],
            offsets,
            len: 0,
        })
    }

    /// Build the grid described by a battle configuration.
    pub fn from_config(config: &BattleConfig) -> Result<Self> {
        Self::with_reach(
            config.grid_cell_size,
            config.grid_size_x,
            config.grid_size_y,
            config.grid_reach,
        )
    }

    /// Convert world coordinates to cell coordinates.
    /// The result may lie outside the grid for positions off the field.
    #[inline]
    pub fn cell_of(&self, position: Vec2) -> CellCoord {
        CellCoord::new(
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    /// The cell a position is registered and queried in: `cell_of`
    /// clamped to the nearest cell inside the grid.
    #[inline]
    pub fn home_cell(&self, position: Vec2) -> CellCoord {
        let cell = self.cell_of(position);
        CellCoord::new(cell.x.clamp(0, self.size_x - 1), cell.y.clamp(0, self.size_y - 1))
    }

    #[inline]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.size_x && cell.y < self.size_y
    }

    #[inline]
    fn index(&self, cell: CellCoord) -> Option<usize> {
        self.contains(cell)
            .then(|| cell.y as usize * self.size_x as usize + cell.x as usize)
    }

    /// Clear all entries (call at start of each frame before rebuilding).
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.len = 0;
    }

    /// Register a tank in its [`home_cell`](Self::home_cell).
    ///
    /// Returns the cell to record on the tank, or None if the position is
    /// not finite (the tank is then skipped).
    pub fn insert(&mut self, entry: SpatialEntry) -> Option<CellCoord> {
        if !entry.position.is_finite() {
            return None;
        }
        let cell = self.home_cell(entry.position);
        let index = self.index(cell)?;
        self.cells[index].push(entry);
        self.len += 1;
        Some(cell)
    }

    /// Neighborhood offsets used for proximity queries.
    pub fn neighbor_offsets(&self) -> &[(i32, i32)] {
        &self.offsets
    }

    /// Tanks registered in a single cell. Out-of-range cells are empty.
    pub fn units_in(&self, cell: CellCoord) -> &[SpatialEntry] {
        match self.index(cell) {
            Some(index) => &self.cells[index],
            None => &[],
        }
    }

    /// Tanks in the neighborhood around `cell`, offset by offset.
    /// Neighbor cells outside the grid are skipped.
    pub fn units_near(&self, cell: CellCoord) -> impl Iterator<Item = &SpatialEntry> + '_ {
        self.offsets
            .iter()
            .flat_map(move |&(dx, dy)| self.units_in(cell.offset(dx, dy)).iter())
    }

    /// Total number of registered tanks.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Grid dimensions in cells.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.size_x as u32, self.size_y as u32)
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Non-empty cells (for debugging/visualization).
    pub fn occupied_cells(&self) -> impl Iterator<Item = (CellCoord, &[SpatialEntry])> + '_ {
        let width = self.size_x as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, entries)| !entries.is_empty())
            .map(move |(i, entries)| {
                let cell = CellCoord::new((i % width) as i32, (i / width) as i32);
                (cell, entries.as_slice())
            })
    }
}

/// System that rebuilds the spatial grid each frame.
///
/// Active tanks are inserted in `TankId` order so cell contents, and with
/// them every scan order derived from the grid, are deterministic.
pub fn spatial_grid_update_system(
    mut grid: ResMut<SpatialGrid>,
    mut query: Query<
        (Entity, &TankId, &Faction, &Position, &CollisionRadius, &Active, &mut GridCell),
        With<Tank>,
    >,
) {
    grid.clear();

    let mut tanks: Vec<_> = query.iter_mut().collect();
    tanks.sort_unstable_by_key(|(_, id, ..)| **id);

    for (entity, id, faction, pos, radius, active, mut cell) in tanks {
        if !active.0 {
            if cell.0.is_some() {
                cell.0 = None;
            }
            continue;
        }

        let registered = grid.insert(SpatialEntry {
            entity,
            id: *id,
            position: pos.0,
            radius: radius.0,
            faction: *faction,
        });
        if registered.is_none() {
            trace!(tank = id.0, x = pos.0.x, y = pos.0.y, "tank position not finite");
        }
        if cell.0 != registered {
            cell.0 = registered;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(raw: u32, x: f32, y: f32, faction: Faction) -> SpatialEntry {
        SpatialEntry {
            entity: Entity::from_raw(raw),
            id: TankId(raw),
            position: Vec2::new(x, y),
            radius: 12.0,
            faction,
        }
    }

    #[test]
    fn test_invalid_dimensions_fail_fast() {
        assert!(SpatialGrid::new(0.0, 10, 10).is_err());
        assert!(SpatialGrid::new(f32::NAN, 10, 10).is_err());
        assert!(SpatialGrid::new(10.0, 0, 10).is_err());
        assert!(SpatialGrid::new(10.0, 10, 0).is_err());
    }

    #[test]
    fn test_cell_of_uses_floor_division() {
        let grid = SpatialGrid::new(10.0, 8, 8).unwrap();
        assert_eq!(grid.cell_of(Vec2::new(0.0, 0.0)), CellCoord::new(0, 0));
        assert_eq!(grid.cell_of(Vec2::new(9.99, 10.0)), CellCoord::new(0, 1));
        assert_eq!(grid.cell_of(Vec2::new(-0.5, 25.0)), CellCoord::new(-1, 2));
    }

    #[test]
    fn test_insert_clamps_off_field_tanks_to_border() {
        let mut grid = SpatialGrid::new(10.0, 4, 4).unwrap();

        assert_eq!(grid.insert(entry(1, 15.0, 35.0, Faction::Blue)), Some(CellCoord::new(1, 3)));
        assert_eq!(grid.insert(entry(2, -1.0, 5.0, Faction::Blue)), Some(CellCoord::new(0, 0)));
        assert_eq!(grid.insert(entry(3, 40.0, 5.0, Faction::Red)), Some(CellCoord::new(3, 0)));
        assert_eq!(grid.insert(entry(4, 15.0, 900.0, Faction::Red)), Some(CellCoord::new(1, 3)));
        assert_eq!(grid.insert(entry(5, f32::NAN, 5.0, Faction::Red)), None);

        assert_eq!(grid.len(), 4);
        assert_eq!(grid.units_in(CellCoord::new(1, 3)).len(), 2);
        assert!(grid.units_in(CellCoord::new(9, 9)).is_empty());
    }

    #[test]
    fn test_off_field_neighbors_are_found_through_home_cell() {
        let mut grid = SpatialGrid::new(10.0, 4, 4).unwrap();
        grid.insert(entry(1, -5.0, 25.0, Faction::Red));
        grid.insert(entry(2, 3.0, 25.0, Faction::Blue));

        let near: Vec<u32> = grid
            .units_near(grid.home_cell(Vec2::new(-8.0, 25.0)))
            .map(|e| e.id.0)
            .collect();
        assert_eq!(near, vec![1, 2]);
    }

    #[test]
    fn test_neighbor_offsets() {
        let grid = SpatialGrid::new(10.0, 4, 4).unwrap();
        assert_eq!(grid.neighbor_offsets().len(), 9);
        assert!(grid.neighbor_offsets().contains(&(0, 0)));
        assert!(grid.neighbor_offsets().contains(&(-1, 1)));

        let wide = SpatialGrid::with_reach(10.0, 4, 4, 2).unwrap();
        assert_eq!(wide.neighbor_offsets().len(), 25);
    }

    #[test]
    fn test_units_near_skips_out_of_range_cells() {
        let mut grid = SpatialGrid::new(10.0, 4, 4).unwrap();
        grid.insert(entry(1, 5.0, 5.0, Faction::Blue)); // (0,0)
        grid.insert(entry(2, 15.0, 15.0, Faction::Red)); // (1,1)
        grid.insert(entry(3, 35.0, 35.0, Faction::Red)); // (3,3)

        // Corner cell: only (0,0), (1,0), (0,1), (1,1) exist
        let near: Vec<u32> = grid.units_near(CellCoord::new(0, 0)).map(|e| e.id.0).collect();
        assert_eq!(near, vec![1, 2]);

        // A cell just outside the grid still sees its in-range neighbors
        let near: Vec<u32> = grid.units_near(CellCoord::new(4, 4)).map(|e| e.id.0).collect();
        assert_eq!(near, vec![3]);
    }

    #[test]
    fn test_clear_empties_every_cell() {
        let mut grid = SpatialGrid::new(10.0, 4, 4).unwrap();
        grid.insert(entry(1, 5.0, 5.0, Faction::Blue));
        grid.insert(entry(2, 25.0, 5.0, Faction::Blue));
        assert_eq!(grid.occupied_cells().count(), 2);

        grid.clear();
        assert!(grid.is_empty());
        assert_eq!(grid.occupied_cells().count(), 0);
    }

    #[test]
    fn test_update_system_rebuilds_and_tracks_cells() {
        let mut world = World::new();
        world.insert_resource(SpatialGrid::new(10.0, 4, 4).unwrap());

        let mut spawn = |id: u32, faction: Faction, active: bool| {
            world
                .spawn((
                    Tank,
                    TankId(id),
                    faction,
                    Position::new(5.0, 5.0),
                    CollisionRadius(3.0),
                    Active(active),
                    GridCell(None),
                ))
                .id()
        };
        let moving = spawn(0, Faction::Blue, true);
        let dead = spawn(1, Faction::Red, false);

        let mut schedule = Schedule::default();
        schedule.add_systems(spatial_grid_update_system);
        schedule.run(&mut world);

        assert_eq!(world.get::<GridCell>(moving).unwrap().0, Some(CellCoord::new(0, 0)));
        assert_eq!(world.get::<GridCell>(dead).unwrap().0, None);
        assert_eq!(world.resource::<SpatialGrid>().len(), 1);

        // Move the tank; the next rebuild re-buckets it without a stale copy
        world.get_mut::<Position>(moving).unwrap().0 = Vec2::new(25.0, 15.0);
        schedule.run(&mut world);

        let grid = world.resource::<SpatialGrid>();
        assert_eq!(grid.len(), 1);
        assert!(grid.units_in(CellCoord::new(0, 0)).is_empty());
        assert_eq!(grid.units_in(CellCoord::new(2, 1))[0].entity, moving);
        assert_eq!(world.get::<GridCell>(moving).unwrap().0, Some(CellCoord::new(2, 1)));
    }
}
