//! Structural world state: the grid, the nests and the food sources.

use crate::grid::Grid;
use crate::nest::{FoodSources, Nest};
use antsim_core::{AntId, Error, FoodAmount, NestId, Position, Result, MAX_NESTS};

#[derive(Debug, Clone)]
pub struct World {
    pub grid: Grid,
    pub nests: Vec<Nest>,
    pub food_sources: FoodSources,
}

impl World {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            grid: Grid::new(rows, columns),
            nests: Vec::with_capacity(MAX_NESTS),
            food_sources: FoodSources::default(),
        }
    }

    pub fn nest(&self, nest_id: NestId) -> &Nest {
        &self.nests[nest_id.index()]
    }

    pub fn nest_mut(&mut self, nest_id: NestId) -> &mut Nest {
        &mut self.nests[nest_id.index()]
    }

    /// Turn the tile at `location` into a new nest
    pub fn place_nest(&mut self, location: Position) -> Result<NestId> {
        if self.nests.len() >= MAX_NESTS {
            return Err(Error::TooManyNests {
                requested: self.nests.len() + 1,
                max: MAX_NESTS,
            });
        }
        self.check_free(location)?;

        let nest_id = NestId(self.nests.len() as u8);
        let tile = self.grid.get_mut(location);
        tile.has_nest = true;
        tile.nest_id = nest_id;
        self.nests.push(Nest::new(nest_id, location));

        Ok(nest_id)
    }

    /// Make `location` a food source holding `amount`.
    /// Returns the change in the tile's food so callers can keep totals in step.
    pub fn place_food(&mut self, location: Position, amount: FoodAmount) -> Result<f64> {
        if !self.grid.contains(location) {
            return Err(Error::InvalidState(format!(
                "food location {} is outside the grid",
                location
            )));
        }
        let tile = self.grid.get_mut(location);
        if tile.has_nest {
            return Err(Error::InvalidState(format!(
                "cannot place food on nest tile {}",
                location
            )));
        }

        let delta = f64::from(amount) - f64::from(tile.food_supply);
        tile.food_supply = amount;
        self.food_sources.register(location);

        Ok(delta)
    }

    /// Record that `ant_id` now stands on `location`
    pub fn occupy(&mut self, location: Position, ant_id: AntId) {
        let tile = self.grid.get_mut(location);
        assert!(!tile.is_full(), "tile {} already holds an ant", location);

        tile.has_ant = true;
        tile.ant_id = ant_id;

        if tile.has_nest {
            let nest_id = tile.nest_id;
            self.nest_mut(nest_id).ant_count += 1;
        }
    }

    /// Record that one ant left `location`. Nest tiles stay occupied until
    /// their last resident leaves.
    pub fn vacate(&mut self, location: Position) {
        let tile = self.grid.get_mut(location);

        if tile.has_nest {
            let nest_id = tile.nest_id;
            let nest = &mut self.nests[nest_id.index()];
            assert!(nest.ant_count != 0, "nest {} has no ants to remove", nest_id);

            nest.ant_count -= 1;
            if nest.ant_count == 0 {
                tile.has_ant = false;
            }
        } else {
            tile.has_ant = false;
        }
    }

    fn check_free(&self, location: Position) -> Result<()> {
        if !self.grid.contains(location) {
            return Err(Error::InvalidState(format!(
                "nest location {} is outside the grid",
                location
            )));
        }
        let tile = self.grid.get(location);
        if tile.has_nest || tile.has_food() || tile.has_ant {
            return Err(Error::InvalidState(format!(
                "tile {} is not free for a nest",
                location
            )));
        }
        Ok(())
    }
}
