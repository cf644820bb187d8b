//! The 2D tile grid.

use serde::{Deserialize, Serialize};

use bazaar_core::{AgentId, ConfigError, Position, Resource};

/// Contents of one grid cell.
///
/// A single enum makes "exactly one of free / resource / water /
/// structure" a type-level fact rather than a runtime check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    /// Free, passable, nothing to collect.
    #[default]
    Empty,
    /// A collectible resource unit.
    Resource(Resource),
    /// Impassable water.
    Water,
    /// A house; passable only by its owner.
    House {
        /// The agent that built it.
        owner: AgentId,
    },
}

impl Tile {
    /// The resource on this tile, if any.
    pub fn resource(self) -> Option<Resource> {
        match self {
            Tile::Resource(r) => Some(r),
            _ => None,
        }
    }
}

/// Row-major grid of [`Tile`]s with per-cell resource sources.
///
/// A *source* records which resource the scenario seeded at a cell.
/// Harvesting clears the tile but keeps the source, so a regeneration
/// rule can restore it later. Nothing in the grid regenerates on its own.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    height: usize,
    width: usize,
    tiles: Vec<Tile>,
    sources: Vec<Option<Resource>>,
}

impl Grid {
    /// Create an all-empty `height x width` grid.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWorldSize`] if either dimension is
    /// zero or the cell count overflows.
    pub fn new(height: usize, width: usize) -> Result<Self, ConfigError> {
        let cells = height
            .checked_mul(width)
            .filter(|&n| n > 0)
            .ok_or(ConfigError::InvalidWorldSize { height, width })?;
        Ok(Self {
            height,
            width,
            tiles: vec![Tile::Empty; cells],
            sources: vec![None; cells],
        })
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.tiles.len()
    }

    /// Whether `pos` lies inside the grid.
    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.height && pos.col < self.width
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.contains(pos).then(|| pos.flat_index(self.width))
    }

    /// The tile at `pos`. Out-of-bounds positions read as [`Tile::Water`]
    /// so they are never passable.
    pub fn tile(&self, pos: Position) -> Tile {
        self.index(pos).map_or(Tile::Water, |i| self.tiles[i])
    }

    /// Overwrite the tile at `pos`. Ignored if out of bounds.
    pub fn set_tile(&mut self, pos: Position, tile: Tile) {
        if let Some(i) = self.index(pos) {
            self.tiles[i] = tile;
        }
    }

    /// The resource source at `pos`, if the scenario seeded one.
    pub fn source(&self, pos: Position) -> Option<Resource> {
        self.index(pos).and_then(|i| self.sources[i])
    }

    /// Mark `pos` as a source of `resource` and place one unit there.
    pub fn seed_resource(&mut self, pos: Position, resource: Resource) {
        if let Some(i) = self.index(pos) {
            self.sources[i] = Some(resource);
            self.tiles[i] = Tile::Resource(resource);
        }
    }

    /// Take the resource at `pos`, leaving the tile empty.
    pub fn take_resource(&mut self, pos: Position) -> Option<Resource> {
        let i = self.index(pos)?;
        let r = self.tiles[i].resource()?;
        self.tiles[i] = Tile::Empty;
        Some(r)
    }

    /// Clear every tile and source.
    pub fn clear(&mut self) {
        self.tiles.fill(Tile::Empty);
        self.sources.fill(None);
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |r| (0..self.width).map(move |c| Position::new(r, c)))
    }

    /// All tiles in row-major order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Number of tiles currently holding `resource`.
    pub fn count_resource(&self, resource: Resource) -> usize {
        self.tiles
            .iter()
            .filter(|t| **t == Tile::Resource(resource))
            .count()
    }

    /// Row-major `0.0/1.0` plane marking tiles matching `pred`.
    pub fn channel(&self, pred: impl Fn(Tile) -> bool) -> Vec<f32> {
        self.tiles
            .iter()
            .map(|&t| if pred(t) { 1.0 } else { 0.0 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimension_rejected() {
        assert!(matches!(
            Grid::new(0, 5),
            Err(ConfigError::InvalidWorldSize {
                height: 0,
                width: 5
            })
        ));
        assert!(Grid::new(5, 0).is_err());
    }

    #[test]
    fn out_of_bounds_reads_as_water() {
        let grid = Grid::new(2, 2).unwrap();
        assert_eq!(grid.tile(Position::new(0, 0)), Tile::Empty);
        assert_eq!(grid.tile(Position::new(2, 0)), Tile::Water);
    }

    #[test]
    fn take_resource_keeps_source() {
        let mut grid = Grid::new(3, 3).unwrap();
        let pos = Position::new(1, 2);
        grid.seed_resource(pos, Resource::Stone);
        assert_eq!(grid.count_resource(Resource::Stone), 1);
        assert_eq!(grid.take_resource(pos), Some(Resource::Stone));
        assert_eq!(grid.tile(pos), Tile::Empty);
        assert_eq!(grid.source(pos), Some(Resource::Stone));
        assert_eq!(grid.take_resource(pos), None);
    }

    #[test]
    fn channel_is_row_major() {
        let mut grid = Grid::new(2, 3).unwrap();
        grid.set_tile(Position::new(1, 0), Tile::Water);
        let water = grid.channel(|t| t == Tile::Water);
        assert_eq!(water, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn positions_cover_grid_in_order() {
        let grid = Grid::new(2, 2).unwrap();
        let all: Vec<_> = grid.positions().collect();
        assert_eq!(
            all,
            vec![
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(1, 0),
                Position::new(1, 1)
            ]
        );
    }
}
