//! Hover inspection: map a mouse location to a tile and describe it.

use crate::grid::Grid;
use crate::simulation::Simulation;
use antsim_core::{
    AntId, AntState, FoodAmount, MouseLocation, NestId, PheromoneStrength, PheromoneType,
    Position,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The tile under `mouse`, or `None` when it falls outside the grid
pub fn tile_at(mouse: MouseLocation, cell_size: f32, grid: &Grid) -> Option<Position> {
    if !(cell_size > 0.0) || mouse.x < 0.0 || mouse.y < 0.0 {
        return None;
    }

    let x = (mouse.x / cell_size).floor();
    let y = (mouse.y / cell_size).floor();
    if x >= grid.columns() as f32 || y >= grid.rows() as f32 {
        return None;
    }

    Some(Position::new(x as i32, y as i32))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TileContents {
    Nest {
        nest_id: NestId,
        ant_count: u32,
        food_supply: FoodAmount,
    },
    Ant {
        ant_id: AntId,
        nest_id: NestId,
        state: AntState,
        hunger: f32,
    },
    Food {
        amount: FoodAmount,
    },
    Empty,
}

/// Trail strengths one nest has left on a tile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NestTrails {
    pub nest_id: NestId,
    pub outbound: PheromoneStrength,
    pub inbound: PheromoneStrength,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDescription {
    pub position: Position,
    pub contents: TileContents,
    /// Decayed to the current tick, one entry per nest
    pub trails: Vec<NestTrails>,
}

impl fmt::Display for TileDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.position)?;

        match &self.contents {
            TileContents::Nest {
                nest_id,
                ant_count,
                food_supply,
            } => write!(
                f,
                "Nest {} ({} ants, {:.1} food)",
                nest_id, ant_count, food_supply
            )?,
            TileContents::Ant {
                ant_id,
                nest_id,
                state,
                hunger,
            } => write!(
                f,
                "Ant {} from nest {} ({}, hunger {:.1})",
                ant_id, nest_id, state, hunger
            )?,
            TileContents::Food { amount } => write!(f, "Food supply: {:.1}", amount)?,
            TileContents::Empty => f.write_str("Empty")?,
        }

        for trails in &self.trails {
            write!(
                f,
                " | nest {} pheromones {:.3}/{:.3}",
                trails.nest_id, trails.outbound, trails.inbound
            )?;
        }

        Ok(())
    }
}

impl Simulation {
    /// Describe the tile at `position` without disturbing the simulation.
    /// Pheromones are decayed on a copy of the tile's trails.
    pub fn describe_tile(&self, position: Position) -> Option<TileDescription> {
        if !self.grid().contains(position) {
            return None;
        }

        let tile = self.grid().get(position);

        let contents = if tile.has_nest {
            let nest_id = tile.nest_id;
            let nest = self.nest(nest_id)?;
            TileContents::Nest {
                nest_id,
                ant_count: nest.ant_count,
                food_supply: nest.food_supply,
            }
        } else if let Some(ant) = tile.has_ant.then(|| self.ant(tile.ant_id)).flatten() {
            TileContents::Ant {
                ant_id: ant.ant_id,
                nest_id: ant.nest_id,
                state: ant.state,
                hunger: ant.hunger,
            }
        } else if tile.food_supply > 0.0 {
            TileContents::Food {
                amount: tile.food_supply,
            }
        } else {
            TileContents::Empty
        };

        let tick = self.tick_count();
        let falloff_rate = self.config().falloff_rate;
        let mut pheromones = tile.pheromones;
        let trails = self
            .nests()
            .iter()
            .map(|nest| {
                pheromones.update(tick, nest.nest_id, falloff_rate);
                NestTrails {
                    nest_id: nest.nest_id,
                    outbound: pheromones.strength(nest.nest_id, PheromoneType::Outbound),
                    inbound: pheromones.strength(nest.nest_id, PheromoneType::Inbound),
                }
            })
            .collect();

        Some(TileDescription {
            position,
            contents,
            trails,
        })
    }
}
