//! 2D grid for the world.

use crate::pheromone::PheromoneTrails;
use antsim_core::{AntId, Direction, FoodAmount, NestId, Position};
use std::ops::{Index, IndexMut};

/// Number of neighbours a tile can have
pub const MAX_NEIGHBORS: usize = 8;

/// Tile state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tile {
    /// Meaningless if `has_ant` is false
    pub ant_id: AntId,
    /// Meaningless if `has_nest` is false
    pub nest_id: NestId,
    pub has_ant: bool,
    pub has_nest: bool,
    pub food_supply: FoodAmount,
    pub pheromones: PheromoneTrails,
}

impl Tile {
    /// A non-nest tile holds at most one ant. Nest tiles never fill up.
    pub fn is_full(&self) -> bool {
        self.has_ant && !self.has_nest
    }

    pub fn has_food(&self) -> bool {
        self.food_supply != 0.0
    }

    /// Whether this tile is the nest `nest`
    pub fn is_nest_of(&self, nest: NestId) -> bool {
        self.has_nest && self.nest_id == nest
    }
}

/// A fixed-size grid with no wrapping at the edges, stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    columns: usize,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            tiles: vec![Tile::default(); rows * columns],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.columns && (pos.y as usize) < self.rows
    }

    /// Get tile at position. Panics when out of bounds.
    pub fn get(&self, pos: Position) -> &Tile {
        let index = self.pos_to_index(pos);
        &self.tiles[index]
    }

    /// Get mutable tile at position. Panics when out of bounds.
    pub fn get_mut(&mut self, pos: Position) -> &mut Tile {
        let index = self.pos_to_index(pos);
        &mut self.tiles[index]
    }

    /// In-bounds neighbours of a position in `Direction::all()` order.
    /// Entries that would fall off the grid are `None`.
    pub fn neighbors(&self, pos: Position) -> [Option<Position>; MAX_NEIGHBORS] {
        let mut neighbors = [None; MAX_NEIGHBORS];

        for (slot, direction) in neighbors.iter_mut().zip(Direction::all()) {
            let (dx, dy) = direction.to_delta();
            let neighbor = pos.add(dx, dy);
            if self.contains(neighbor) {
                *slot = Some(neighbor);
            }
        }

        neighbors
    }

    /// Sum of the food held by every tile
    pub fn total_food(&self) -> FoodAmount {
        self.total_food_exact() as FoodAmount
    }

    /// Sum of every tile's food, accumulated without rounding
    pub fn total_food_exact(&self) -> f64 {
        self.tiles
            .iter()
            .map(|tile| f64::from(tile.food_supply))
            .sum()
    }

    fn pos_to_index(&self, pos: Position) -> usize {
        assert!(
            self.contains(pos),
            "position {} is outside the {}x{} grid",
            pos,
            self.rows,
            self.columns
        );
        pos.y as usize * self.columns + pos.x as usize
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        let x = (index % self.columns) as i32;
        let y = (index / self.columns) as i32;
        Position::new(x, y)
    }

    /// Iterator over all positions
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.tiles.len()).map(move |i| self.index_to_pos(i))
    }

    /// Iterator over all tiles with positions
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Tile)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, tile)| (self.index_to_pos(i), tile))
    }
}

/// `grid[(row, col)]`
impl Index<(usize, usize)> for Grid {
    type Output = Tile;

    fn index(&self, (row, col): (usize, usize)) -> &Tile {
        assert!(row < self.rows && col < self.columns);
        &self.tiles[row * self.columns + col]
    }
}

impl IndexMut<(usize, usize)> for Grid {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Tile {
        assert!(row < self.rows && col < self.columns);
        &mut self.tiles[row * self.columns + col]
    }
}

impl Index<Position> for Grid {
    type Output = Tile;

    fn index(&self, pos: Position) -> &Tile {
        self.get(pos)
    }
}

impl IndexMut<Position> for Grid {
    fn index_mut(&mut self, pos: Position) -> &mut Tile {
        self.get_mut(pos)
    }
}
