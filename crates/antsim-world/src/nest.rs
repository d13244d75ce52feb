//! Nests and food sources: the colony economy.

use crate::grid::Grid;
use antsim_core::{FoodAmount, NestId, Position};
use serde::{Deserialize, Serialize};

/// A colony's home tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nest {
    pub nest_id: NestId,
    pub location: Position,
    /// Ants currently standing on the nest tile, queen included
    pub ant_count: u32,
    /// Food stored by returning workers. Not capped.
    pub food_supply: FoodAmount,
}

impl Nest {
    pub fn new(nest_id: NestId, location: Position) -> Self {
        Self {
            nest_id,
            location,
            ant_count: 0,
            food_supply: 0.0,
        }
    }

    /// Store as much of `amount` as fits and return what was stored
    pub fn deposit(&mut self, amount: FoodAmount) -> FoodAmount {
        let headroom = FoodAmount::MAX - self.food_supply;
        let deposited = amount.min(headroom);
        self.food_supply += deposited;
        deposited
    }

    /// Debit `cost` if the stock covers it
    pub fn try_spend(&mut self, cost: FoodAmount) -> bool {
        if self.food_supply >= cost {
            self.food_supply -= cost;
            true
        } else {
            false
        }
    }
}

/// The fixed set of tiles that regrow food
#[derive(Debug, Clone, Default)]
pub struct FoodSources {
    locations: Vec<Position>,
}

impl FoodSources {
    pub fn register(&mut self, location: Position) {
        if !self.locations.contains(&location) {
            self.locations.push(location);
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Regrow every source by up to `rate`, never past `max_supply`.
    /// Returns the food actually added, measured after the tile's own rounding,
    /// so the global counter can follow it exactly.
    pub fn resupply(&self, grid: &mut Grid, rate: FoodAmount, max_supply: FoodAmount) -> f64 {
        let mut added = 0.0;

        for &location in &self.locations {
            let tile = grid.get_mut(location);
            let before = tile.food_supply;
            let delta = rate.min(max_supply - before).max(0.0);
            tile.food_supply = (before + delta).min(max_supply.max(before));
            added += f64::from(tile.food_supply) - f64::from(before);
        }

        added
    }
}
