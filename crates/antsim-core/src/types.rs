//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The type used to store the current tick count
pub type Tick = u32;

/// Amount of food held by a tile, an ant's inventory or a nest
pub type FoodAmount = f32;

pub type PheromoneStrength = f32;

/// Maximum number of nests a world can hold. Each tile stores one set of
/// pheromone trails per nest, so this bounds the size of every tile.
pub const MAX_NESTS: usize = 2;

/// Number of pheromone types laid by each colony
pub const PHEROMONE_TYPE_COUNT: usize = 2;

/// Unique identifier for an ant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AntId(pub u32);

impl fmt::Display for AntId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a nest, also used to index per-nest tile data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NestId(pub u8);

impl NestId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 2D position in the world. `x` is the column and `y` the row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Direction for movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::NorthEast => (1, -1),
            Direction::NorthWest => (-1, -1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (-1, 1),
        }
    }

    /// All directions in neighbour enumeration order. Ties between equally
    /// weighted neighbours are broken in favour of the earliest entry, so this
    /// order is part of the simulation's deterministic behaviour.
    pub fn all() -> [Direction; 8] {
        [
            Direction::NorthWest,
            Direction::West,
            Direction::SouthWest,
            Direction::NorthEast,
            Direction::East,
            Direction::SouthEast,
            Direction::North,
            Direction::South,
        ]
    }
}

/// Ant role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Caste {
    /// Stays on its nest and turns stored food into new workers
    Queen,
    Worker,
}

/// Behaviour state of a worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AntState {
    /// Looking for food, carrying nothing
    #[default]
    Searching,
    /// Carrying food back to the nest
    Returning,
}

impl AntState {
    /// The pheromone an ant in this state leaves behind it
    pub fn trail(self) -> PheromoneType {
        match self {
            AntState::Searching => PheromoneType::Outbound,
            AntState::Returning => PheromoneType::Inbound,
        }
    }
}

impl fmt::Display for AntState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AntState::Searching => write!(f, "Searching"),
            AntState::Returning => write!(f, "Returning"),
        }
    }
}

/// Pheromone types, indexed in each tile's trail arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PheromoneType {
    /// Type 1, laid while searching
    Outbound = 0,
    /// Type 2, laid while returning
    Inbound = 1,
}

impl PheromoneType {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn all() -> [PheromoneType; PHEROMONE_TYPE_COUNT] {
        [PheromoneType::Outbound, PheromoneType::Inbound]
    }
}

/// Run state of the simulation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RunState {
    #[default]
    Running = 0,
    /// Terminal; no further ticks are accepted
    Stopped = 1,
    /// Run exactly one tick, then pause
    SingleStep = 2,
    Paused = 3,
}

impl RunState {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(RunState::Running),
            1 => Some(RunState::Stopped),
            2 => Some(RunState::SingleStep),
            3 => Some(RunState::Paused),
            _ => None,
        }
    }

    /// Whether a tick may run in this state
    pub fn accepts_ticks(self) -> bool {
        matches!(self, RunState::Running | RunState::SingleStep)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Running => "running",
            RunState::Stopped => "stopped",
            RunState::SingleStep => "single_step",
            RunState::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Last known mouse location in world coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MouseLocation {
    pub x: f32,
    pub y: f32,
}

impl MouseLocation {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Pack both coordinates into one word so they can live in a single atomic
    pub fn to_bits(self) -> u64 {
        ((self.x.to_bits() as u64) << 32) | self.y.to_bits() as u64
    }

    pub fn from_bits(bits: u64) -> Self {
        Self {
            x: f32::from_bits((bits >> 32) as u32),
            y: f32::from_bits(bits as u32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::North.to_delta(), (0, -1));
        assert_eq!(Direction::South.to_delta(), (0, 1));
        assert_eq!(Direction::East.to_delta(), (1, 0));
        assert_eq!(Direction::West.to_delta(), (-1, 0));
    }

    #[test]
    fn test_direction_enumeration_order() {
        let deltas: Vec<_> = Direction::all().iter().map(|d| d.to_delta()).collect();
        assert_eq!(
            deltas,
            vec![(-1, -1), (-1, 0), (-1, 1), (1, -1), (1, 0), (1, 1), (0, -1), (0, 1)]
        );
    }

    #[test]
    fn test_run_state_round_trip() {
        for state in [
            RunState::Running,
            RunState::Stopped,
            RunState::SingleStep,
            RunState::Paused,
        ] {
            assert_eq!(RunState::from_u8(state.as_u8()), Some(state));
        }
        assert_eq!(RunState::from_u8(42), None);
        assert!(RunState::SingleStep.accepts_ticks());
        assert!(!RunState::Paused.accepts_ticks());
    }

    #[test]
    fn test_mouse_location_packing() {
        let mouse = MouseLocation::new(-12.5, 340.25);
        assert_eq!(MouseLocation::from_bits(mouse.to_bits()), mouse);
    }

    #[test]
    fn test_trail_per_state() {
        assert_eq!(AntState::Searching.trail().index(), 0);
        assert_eq!(AntState::Returning.trail().index(), 1);
    }
}
