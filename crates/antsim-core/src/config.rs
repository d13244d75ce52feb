//! Configuration types for the simulation.

use crate::error::{Error, Result};
use crate::types::{FoodAmount, MAX_NESTS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming a JSON configuration file
pub const CONFIG_ENV_VAR: &str = "ANTSIM_CONFIG";

/// Random perturbation applied to pheromone strengths when ants weigh a tile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterConfig {
    /// Lower bound of the additive perturbation
    pub add_min: f32,
    /// Upper bound of the additive perturbation
    pub add_max: f32,
    /// Lower bound of the multiplicative scale
    pub scale_min: f32,
    /// Upper bound of the multiplicative scale
    pub scale_max: f32,
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            add_min: -1.0,
            add_max: 1.0,
            scale_min: 0.75,
            scale_max: 1.25,
        }
    }
}

/// World and colony parameters, fixed for the lifetime of a simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of grid rows
    pub rows: usize,
    /// Number of grid columns
    pub columns: usize,
    /// Number of nests, at most `MAX_NESTS`
    pub nest_count: usize,
    /// Ants created per nest at generation time, the first one is the queen
    pub ant_count_per_nest: u32,
    /// Random seed for reproducibility, drawn at startup when absent
    pub seed: Option<u64>,
    /// Hunger gained by a worker every tick
    pub hunger_increase_per_tick: f32,
    /// Hunger at which a worker dies
    pub hunger_to_die: f32,
    /// Food picked up per visit to a food tile
    pub food_taken: FoodAmount,
    /// Food regenerated per tick by each food source
    pub food_resupply_rate: FoodAmount,
    /// Maximum food held by a food source
    pub max_food_supply: FoodAmount,
    /// Nest food spent by a queen to create one worker
    pub food_per_new_ant: FoodAmount,
    /// Food units needed to remove one unit of hunger
    pub food_hunger_ratio: f32,
    /// Pheromone strength lost per tick
    pub falloff_rate: f32,
    /// Pheromone strength deposited per step
    pub increase_rate: f32,
    /// How strongly searching ants avoid type 1 (outbound) trails
    pub type1_avoidance: f32,
    /// How strongly returning ants avoid type 2 (inbound) trails
    pub type2_avoidance: f32,
    pub jitter: JitterConfig,
    /// Probability that a tile starts as a food source (0.0 to 1.0)
    pub food_density: f32,
    /// Food held by a food source at generation time
    pub initial_food_supply: FoodAmount,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rows: 100,
            columns: 100,
            nest_count: 2,
            ant_count_per_nest: 20,
            seed: None,
            hunger_increase_per_tick: 1.0,
            hunger_to_die: 500.0,
            food_taken: 10.0,
            food_resupply_rate: 0.1,
            max_food_supply: 255.0,
            food_per_new_ant: 50.0,
            food_hunger_ratio: 0.1,
            falloff_rate: 0.01,
            increase_rate: 1.0,
            type1_avoidance: 1.0,
            type2_avoidance: 1.0,
            jitter: JitterConfig::default(),
            food_density: 0.01,
            initial_food_supply: 255.0,
        }
    }
}

impl SimulationConfig {
    /// Check the configuration before a simulation is built from it
    pub fn validate(&self) -> Result<()> {
        if self.nest_count > MAX_NESTS {
            return Err(Error::TooManyNests {
                requested: self.nest_count,
                max: MAX_NESTS,
            });
        }

        if self.rows == 0 || self.columns == 0 {
            return Err(Error::Configuration(format!(
                "grid must have at least one row and column, got {}x{}",
                self.rows, self.columns
            )));
        }

        if i32::try_from(self.rows).is_err() || i32::try_from(self.columns).is_err() {
            return Err(Error::Configuration(format!(
                "grid dimensions {}x{} are too large",
                self.rows, self.columns
            )));
        }

        if self.rows * self.columns < self.nest_count {
            return Err(Error::Configuration(format!(
                "a {}x{} grid cannot hold {} nests",
                self.rows, self.columns, self.nest_count
            )));
        }

        if !(self.food_hunger_ratio.is_finite() && self.food_hunger_ratio > 0.0) {
            return Err(Error::Configuration(format!(
                "food_hunger_ratio must be positive, got {}",
                self.food_hunger_ratio
            )));
        }

        let non_negative = [
            ("hunger_increase_per_tick", self.hunger_increase_per_tick),
            ("hunger_to_die", self.hunger_to_die),
            ("food_taken", self.food_taken),
            ("food_resupply_rate", self.food_resupply_rate),
            ("max_food_supply", self.max_food_supply),
            ("food_per_new_ant", self.food_per_new_ant),
            ("falloff_rate", self.falloff_rate),
            ("increase_rate", self.increase_rate),
            ("initial_food_supply", self.initial_food_supply),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::Configuration(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.food_density) {
            return Err(Error::Configuration(format!(
                "food_density must be between 0 and 1, got {}",
                self.food_density
            )));
        }

        let jitter = &self.jitter;
        if !(jitter.add_min <= jitter.add_max && jitter.scale_min <= jitter.scale_max) {
            return Err(Error::Configuration(format!(
                "jitter ranges are inverted: add {}..{}, scale {}..{}",
                jitter.add_min, jitter.add_max, jitter.scale_min, jitter.scale_max
            )));
        }

        Ok(())
    }
}

/// Log output format of the runner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Sleep between ticks (milliseconds)
    pub tick_interval_ms: u64,
    /// Stop the simulation after this many ticks
    pub max_ticks: Option<u64>,
    /// Interval between inspector snapshots (milliseconds)
    pub inspect_interval_ms: u64,
    /// Log every ant movement
    pub log_ant_movements: bool,
    /// Log ants switching between searching and returning
    pub log_ant_state_changes: bool,
    pub log_format: LogFormat,
    /// Size of one tile in mouse coordinates
    pub cell_size: f32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            max_ticks: Some(1200),
            inspect_interval_ms: 1000,
            log_ant_movements: false,
            log_ant_state_changes: false,
            log_format: LogFormat::Pretty,
            cell_size: 20.0,
        }
    }
}

/// Complete configuration of a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub runner: RunnerConfig,
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(json)?;
        config.simulation.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Load from the file named by `ANTSIM_CONFIG`, or fall back to defaults
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_json_file(path),
            None => Ok(Self::default()),
        }
    }
}
