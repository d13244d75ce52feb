//! Ant colony simulation engine.
//!
//! This crate implements the grid world, the ants that forage on it, and the
//! engine that advances them one tick at a time.

pub mod ant;
pub mod grid;
pub mod inspect;
pub mod nest;
pub mod pheromone;
pub mod scalars;
pub mod shared;
pub mod simulation;
pub mod world;

pub use ant::Ant;
pub use grid::{Grid, Tile};
pub use inspect::{tile_at, TileContents, TileDescription};
pub use nest::{FoodSources, Nest};
pub use pheromone::{update_pheromones, PheromoneTrails};
pub use scalars::SharedScalars;
pub use shared::{EngineOptions, SharedSimulation};
pub use simulation::{NestStats, Simulation, SimulationStats};
pub use world::World;
