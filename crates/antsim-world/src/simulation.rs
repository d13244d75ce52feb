//! Simulation engine: owns the world, the ants and the RNG, and runs ticks.

use crate::ant::{Ant, Jitter, TickContext};
use crate::grid::Grid;
use crate::nest::{FoodSources, Nest};
use crate::scalars::SharedScalars;
use crate::world::World;
use antsim_core::{
    AntId, Caste, Error, FoodAmount, NestId, Position, Result, RunState, SimulationConfig, Tick,
    MAX_NESTS,
};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub struct Simulation {
    world: World,
    /// Ordered by id so every run with the same seed visits ants in the same order
    ants: BTreeMap<AntId, Ant>,
    birth_queue: Vec<NestId>,
    config: SimulationConfig,
    jitter: Jitter,
    rng: ChaCha8Rng,
    seed: u64,
    scalars: Arc<SharedScalars>,
    next_ant_id: u32,
    births: u64,
    deaths: u64,
}

impl Simulation {
    /// Build a simulation and generate its world from `config`
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let nest_count = config.nest_count;
        let ant_count_per_nest = config.ant_count_per_nest;

        let mut sim = Self::blank(config)?;
        sim.generate(nest_count, ant_count_per_nest)?;

        Ok(sim)
    }

    /// Build a simulation with an empty world. Nests, food and ants can then be
    /// placed by hand with `place_nest`, `place_food` and `add_ant`.
    pub fn blank(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        info!(
            event = "seed_selected",
            seed = seed,
            random = config.seed.is_none(),
            "Using seed {}",
            seed
        );

        Ok(Self {
            world: World::new(config.rows, config.columns),
            ants: BTreeMap::new(),
            birth_queue: Vec::new(),
            jitter: Jitter::new(&config.jitter),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            config,
            scalars: Arc::new(SharedScalars::new()),
            next_ant_id: 0,
            births: 0,
            deaths: 0,
        })
    }

    /// Randomly place nests, fill them with ants and scatter food sources.
    /// Only valid on a world with nothing placed in it yet.
    pub fn generate(&mut self, nest_count: usize, ant_count_per_nest: u32) -> Result<()> {
        let occupied = !self.world.nests.is_empty()
            || !self.ants.is_empty()
            || !self.world.food_sources.is_empty();
        if occupied {
            return Err(Error::InvalidState(
                "world generation requires an empty world".to_string(),
            ));
        }

        if nest_count > MAX_NESTS {
            return Err(Error::TooManyNests {
                requested: nest_count,
                max: MAX_NESTS,
            });
        }

        if nest_count > self.config.rows * self.config.columns {
            return Err(Error::Configuration(format!(
                "{} nests do not fit on a {}x{} grid",
                nest_count, self.config.rows, self.config.columns
            )));
        }

        let rows = self.config.rows as i32;
        let columns = self.config.columns as i32;

        let mut placed = Vec::with_capacity(nest_count);
        for _ in 0..nest_count {
            let location = loop {
                let x = self.rng.gen_range(0..columns);
                let y = self.rng.gen_range(0..rows);
                let candidate = Position::new(x, y);
                if !self.world.grid.get(candidate).has_nest {
                    break candidate;
                }
            };

            let nest_id = self.world.place_nest(location)?;
            info!(
                event = "nest_placed",
                nest_id = %nest_id,
                x = location.x,
                y = location.y,
                "Nest {} placed at {}",
                nest_id,
                location
            );
            placed.push(nest_id);
        }

        for &nest_id in &placed {
            let location = self.world.nest(nest_id).location;

            for i in 0..ant_count_per_nest {
                // Each nest has a single queen
                let caste = if i == 0 { Caste::Queen } else { Caste::Worker };
                let ant_id = AntId(nest_id.0 as u32 * ant_count_per_nest + i);
                self.insert_ant(Ant::new(ant_id, nest_id, caste, location));
            }
        }

        let food = self
            .config
            .initial_food_supply
            .min(self.config.max_food_supply);

        for position in self.world.grid.positions().collect::<Vec<_>>() {
            let roll = self.rng.gen::<f32>();
            if roll < self.config.food_density && !self.world.grid.get(position).has_nest {
                self.place_food(position, food)?;
            }
        }

        info!(
            event = "world_generated",
            nests = self.world.nests.len(),
            ants = self.ants.len(),
            food_sources = self.world.food_sources.len(),
            food_count = self.scalars.food_count(),
            "World generated"
        );

        Ok(())
    }

    pub fn place_nest(&mut self, location: Position) -> Result<NestId> {
        self.world.place_nest(location)
    }

    /// Make `location` a regrowing food source holding `amount`
    pub fn place_food(&mut self, location: Position, amount: FoodAmount) -> Result<()> {
        let delta = self.world.place_food(location, amount)?;
        self.scalars.adjust_food_count(delta);
        Ok(())
    }

    /// Create an ant on its nest's tile right away. Must not be called while
    /// ants are being iterated; births during a tick go through `queue_ant`.
    pub fn add_ant(&mut self, nest_id: NestId, caste: Caste) -> Result<AntId> {
        self.check_nest(nest_id)?;
        Ok(self.spawn_ant(nest_id, caste))
    }

    /// Ask for a worker to be added to `nest_id` at the next flush point
    pub fn queue_ant(&mut self, nest_id: NestId) -> Result<()> {
        self.check_nest(nest_id)?;
        self.birth_queue.push(nest_id);
        Ok(())
    }

    /// Run one tick if the run state allows it. Returns whether a tick ran.
    pub fn tick(&mut self) -> bool {
        let state = self.scalars.state();
        if !state.accepts_ticks() {
            return false;
        }

        let tick = self.scalars.tick_count();
        let ants_before = self.ants.len();

        let mut ctx = TickContext {
            world: &mut self.world,
            rng: &mut self.rng,
            config: &self.config,
            jitter: &self.jitter,
            scalars: self.scalars.as_ref(),
            birth_queue: &mut self.birth_queue,
            tick,
        };

        // Dead ants are dropped during the same traversal
        self.ants.retain(|_, ant| {
            ant.tick(&mut ctx);
            ant.is_alive()
        });

        self.deaths += (ants_before - self.ants.len()) as u64;

        self.flush_births();

        let added = self.world.food_sources.resupply(
            &mut self.world.grid,
            self.config.food_resupply_rate,
            self.config.max_food_supply,
        );
        self.scalars.adjust_food_count(added);

        let tick_count = self.scalars.increment_tick();

        if state == RunState::SingleStep {
            self.scalars.transition(RunState::SingleStep, RunState::Paused);
        }

        debug!(
            event = "tick_summary",
            tick = tick_count,
            ant_count = self.ants.len(),
            food_count = self.scalars.food_count(),
            "Tick complete"
        );

        true
    }

    /// Run up to `ticks` ticks, stopping early if the run state refuses one.
    /// Returns the number of ticks executed.
    #[instrument(skip(self))]
    pub fn run(&mut self, ticks: u32) -> u32 {
        let mut executed = 0;
        while executed < ticks && self.tick() {
            executed += 1;
        }
        executed
    }

    fn flush_births(&mut self) {
        for nest_id in std::mem::take(&mut self.birth_queue) {
            let ant_id = self.spawn_ant(nest_id, Caste::Worker);
            self.births += 1;

            debug!(
                event = "ant_birth",
                ant_id = %ant_id,
                nest_id = %nest_id,
                tick = self.scalars.tick_count(),
                "Ant born"
            );
        }
    }

    fn spawn_ant(&mut self, nest_id: NestId, caste: Caste) -> AntId {
        let ant_id = AntId(self.next_ant_id);
        let location = self.world.nest(nest_id).location;
        self.insert_ant(Ant::new(ant_id, nest_id, caste, location));
        ant_id
    }

    fn insert_ant(&mut self, ant: Ant) {
        self.next_ant_id = self.next_ant_id.max(ant.ant_id.0 + 1);
        self.world.occupy(ant.location, ant.ant_id);
        self.ants.insert(ant.ant_id, ant);
    }

    fn check_nest(&self, nest_id: NestId) -> Result<()> {
        if nest_id.index() < self.world.nests.len() {
            Ok(())
        } else {
            Err(Error::InvalidState(format!("nest {} does not exist", nest_id)))
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.world.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.world.grid
    }

    pub fn ants(&self) -> &BTreeMap<AntId, Ant> {
        &self.ants
    }

    pub fn ant(&self, ant_id: AntId) -> Option<&Ant> {
        self.ants.get(&ant_id)
    }

    pub fn nests(&self) -> &[Nest] {
        &self.world.nests
    }

    pub fn nest(&self, nest_id: NestId) -> Option<&Nest> {
        self.world.nests.get(nest_id.index())
    }

    pub fn nest_mut(&mut self, nest_id: NestId) -> Option<&mut Nest> {
        self.world.nests.get_mut(nest_id.index())
    }

    pub fn food_sources(&self) -> &FoodSources {
        &self.world.food_sources
    }

    /// Live ants owned by `nest_id`, whether at home or out foraging
    pub fn population(&self, nest_id: NestId) -> usize {
        self.ants.values().filter(|ant| ant.nest_id == nest_id).count()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The lock-free scalars shared with observers
    pub fn scalars(&self) -> &Arc<SharedScalars> {
        &self.scalars
    }

    pub fn tick_count(&self) -> Tick {
        self.scalars.tick_count()
    }

    pub fn food_count(&self) -> FoodAmount {
        self.scalars.food_count()
    }

    pub fn state(&self) -> RunState {
        self.scalars.state()
    }

    pub fn set_state(&self, state: RunState) -> bool {
        self.scalars.set_state(state)
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            tick: self.tick_count(),
            ant_count: self.ants.len(),
            food_count: self.food_count(),
            births: self.births,
            deaths: self.deaths,
            nests: self
                .world
                .nests
                .iter()
                .map(|nest| NestStats {
                    nest_id: nest.nest_id,
                    location: nest.location,
                    ants_at_nest: nest.ant_count,
                    population: self.population(nest.nest_id),
                    food_supply: nest.food_supply,
                })
                .collect(),
        }
    }
}

/// Snapshot of the simulation's counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub tick: Tick,
    pub ant_count: usize,
    pub food_count: FoodAmount,
    pub births: u64,
    pub deaths: u64,
    pub nests: Vec<NestStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestStats {
    pub nest_id: NestId,
    pub location: Position,
    pub ants_at_nest: u32,
    pub population: usize,
    pub food_supply: FoodAmount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use antsim_core::{AntState, JitterConfig};

    /// Deterministic weights, no hunger, no trail decay
    fn quiet_config(rows: usize, columns: usize) -> SimulationConfig {
        SimulationConfig {
            rows,
            columns,
            nest_count: 0,
            ant_count_per_nest: 0,
            seed: Some(1),
            hunger_increase_per_tick: 0.0,
            falloff_rate: 0.0,
            jitter: JitterConfig {
                add_min: 0.0,
                add_max: 0.0,
                scale_min: 1.0,
                scale_max: 1.0,
            },
            ..Default::default()
        }
    }

    fn only_ant(sim: &Simulation) -> &Ant {
        assert_eq!(sim.ants().len(), 1);
        sim.ants().values().next().unwrap()
    }

    fn assert_invariants(sim: &Simulation) {
        let config = sim.config();

        let counted = sim.scalars().food_count_exact();
        let on_tiles = sim.grid().total_food_exact();
        assert!(
            (counted - on_tiles).abs() < 1e-6,
            "food counter {} drifted from tile sum {}",
            counted,
            on_tiles
        );
        for (_, tile) in sim.grid().iter() {
            assert!(tile.food_supply >= 0.0);
            assert!(tile.food_supply <= config.max_food_supply);
        }

        let mut seen = std::collections::HashSet::new();
        for ant in sim.ants().values() {
            assert!(ant.is_alive());
            assert!(ant.hunger >= 0.0 && ant.hunger < config.hunger_to_die);

            let tile = sim.grid().get(ant.location);
            assert!(tile.has_ant);
            if !tile.has_nest {
                assert!(seen.insert(ant.location), "two ants on {}", ant.location);
                assert_eq!(tile.ant_id, ant.ant_id);
            }
        }

        for nest in sim.nests() {
            let resident = sim
                .ants()
                .values()
                .filter(|ant| ant.location == nest.location)
                .count();
            assert_eq!(nest.ant_count as usize, resident);
            assert_eq!(sim.grid().get(nest.location).has_ant, resident > 0);
        }
    }

    #[test]
    fn test_simulation_creation() {
        let config = SimulationConfig {
            rows: 30,
            columns: 40,
            nest_count: 2,
            ant_count_per_nest: 5,
            seed: Some(42),
            food_density: 0.05,
            ..Default::default()
        };

        let sim = Simulation::new(config).unwrap();

        assert_eq!(sim.seed(), 42);
        assert_eq!(sim.nests().len(), 2);
        assert_eq!(sim.ants().len(), 10);
        assert_ne!(sim.nests()[0].location, sim.nests()[1].location);

        for nest in sim.nests() {
            assert_eq!(nest.ant_count, 5);
            assert_eq!(sim.population(nest.nest_id), 5);
            let queens = sim
                .ants()
                .values()
                .filter(|a| a.nest_id == nest.nest_id && a.caste == Caste::Queen)
                .count();
            assert_eq!(queens, 1);
            assert!(!sim.grid().get(nest.location).has_food());
        }

        let queen = sim.ant(AntId(5)).unwrap();
        assert_eq!(queen.nest_id, NestId(1));
        assert_eq!(queen.caste, Caste::Queen);

        assert!(!sim.food_sources().is_empty());
        assert_invariants(&sim);
    }

    #[test]
    fn test_too_many_nests_is_fatal() {
        let config = SimulationConfig {
            nest_count: MAX_NESTS + 1,
            ..Default::default()
        };
        assert!(matches!(
            Simulation::new(config),
            Err(Error::TooManyNests { .. })
        ));
    }

    #[test]
    fn test_forage_round_trip_through_corridor() {
        // nest | empty | food
        let mut sim = Simulation::blank(quiet_config(1, 3)).unwrap();
        let nest = sim.place_nest(Position::new(0, 0)).unwrap();
        sim.place_food(Position::new(2, 0), 255.0).unwrap();
        sim.add_ant(nest, Caste::Worker).unwrap();

        sim.run(2);
        let ant = only_ant(&sim);
        assert_eq!(ant.location, Position::new(2, 0));
        assert_eq!(ant.state, AntState::Returning);
        assert_eq!(ant.food_in_inventory, 10.0);
        assert_eq!(sim.nest(nest).unwrap().ant_count, 0);
        assert!(!sim.grid().get(Position::new(0, 0)).has_ant);

        sim.run(2);
        let ant = only_ant(&sim);
        assert_eq!(ant.location, Position::new(0, 0));
        assert_eq!(ant.state, AntState::Searching);
        assert_eq!(ant.food_in_inventory, 0.0);
        assert_eq!(sim.nest(nest).unwrap().food_supply, 10.0);
        assert_eq!(sim.nest(nest).unwrap().ant_count, 1);
        assert_eq!(sim.tick_count(), 4);
        assert_invariants(&sim);
    }

    #[test]
    fn test_forage_round_trip_with_adjacent_food() {
        let mut sim = Simulation::blank(quiet_config(1, 2)).unwrap();
        let nest = sim.place_nest(Position::new(0, 0)).unwrap();
        sim.place_food(Position::new(1, 0), 4.0).unwrap();
        sim.add_ant(nest, Caste::Worker).unwrap();

        assert!(sim.tick());
        let ant = only_ant(&sim);
        assert_eq!(ant.state, AntState::Returning);
        assert_eq!(ant.food_in_inventory, 4.0);

        assert!(sim.tick());
        let ant = only_ant(&sim);
        assert_eq!(ant.location, Position::new(0, 0));
        assert_eq!(ant.state, AntState::Searching);
        assert_eq!(sim.nest(nest).unwrap().food_supply, 4.0);
        assert_invariants(&sim);
    }

    #[test]
    fn test_starving_worker_is_removed_after_two_ticks() {
        let mut config = quiet_config(3, 3);
        config.hunger_increase_per_tick = 50.0;
        config.hunger_to_die = 100.0;
        let mut sim = Simulation::blank(config).unwrap();
        let nest = sim.place_nest(Position::new(1, 1)).unwrap();
        let ant_id = sim.add_ant(nest, Caste::Worker).unwrap();

        assert!(sim.tick());
        let location = sim.ant(ant_id).unwrap().location;
        assert_ne!(location, Position::new(1, 1));
        assert!(sim.grid().get(location).has_ant);

        assert!(sim.tick());
        assert!(sim.ant(ant_id).is_none());
        assert!(!sim.grid().get(location).has_ant);
        assert_eq!(sim.stats().deaths, 1);
        assert_invariants(&sim);
    }

    #[test]
    fn test_queen_birth_is_flushed_after_iteration() {
        let mut config = quiet_config(3, 3);
        config.food_per_new_ant = 150.0;
        config.hunger_increase_per_tick = 1.0;
        let mut sim = Simulation::blank(config).unwrap();
        let nest = sim.place_nest(Position::new(1, 1)).unwrap();
        let queen = sim.add_ant(nest, Caste::Queen).unwrap();
        sim.nest_mut(nest).unwrap().food_supply = 150.0;

        assert!(sim.tick());

        assert_eq!(sim.ants().len(), 2);
        assert_eq!(sim.nest(nest).unwrap().food_supply, 0.0);
        assert_eq!(sim.stats().births, 1);

        let newborn = sim.ants().values().find(|a| a.ant_id != queen).unwrap();
        assert_eq!(newborn.caste, Caste::Worker);
        assert_eq!(newborn.location, Position::new(1, 1));
        // It did not take a turn during the tick it was born in
        assert_eq!(newborn.hunger, 0.0);
        assert_eq!(sim.nest(nest).unwrap().ant_count, 2);

        assert!(sim.tick());
        assert_eq!(sim.ants().len(), 2);
    }

    #[test]
    fn test_queued_ant_requires_existing_nest() {
        let mut sim = Simulation::blank(quiet_config(2, 2)).unwrap();
        assert!(sim.queue_ant(NestId(0)).is_err());
        assert!(sim.add_ant(NestId(1), Caste::Worker).is_err());

        let nest = sim.place_nest(Position::new(0, 0)).unwrap();
        sim.queue_ant(nest).unwrap();
        assert!(sim.ants().is_empty());
        sim.tick();
        assert_eq!(sim.population(nest), 1);
    }

    #[test]
    fn test_food_regrows_up_to_cap() {
        let mut config = quiet_config(2, 2);
        config.food_resupply_rate = 3.0;
        config.max_food_supply = 10.0;
        let mut sim = Simulation::blank(config).unwrap();
        sim.place_food(Position::new(0, 0), 5.0).unwrap();
        assert_eq!(sim.food_count(), 5.0);

        sim.tick();
        assert_eq!(sim.grid().get(Position::new(0, 0)).food_supply, 8.0);
        sim.tick();
        assert_eq!(sim.grid().get(Position::new(0, 0)).food_supply, 10.0);
        assert_eq!(sim.food_count(), 10.0);
    }

    #[test]
    fn test_run_states() {
        let mut sim = Simulation::blank(quiet_config(2, 2)).unwrap();

        sim.set_state(RunState::Paused);
        assert!(!sim.tick());
        assert_eq!(sim.tick_count(), 0);

        sim.set_state(RunState::SingleStep);
        assert!(sim.tick());
        assert_eq!(sim.state(), RunState::Paused);
        assert!(!sim.tick());
        assert_eq!(sim.tick_count(), 1);

        sim.set_state(RunState::Running);
        assert_eq!(sim.run(3), 3);

        sim.set_state(RunState::Stopped);
        assert!(!sim.set_state(RunState::Running));
        assert_eq!(sim.run(5), 0);
        assert_eq!(sim.tick_count(), 4);
    }

    #[test]
    fn test_same_seed_same_history() {
        let config = SimulationConfig {
            rows: 20,
            columns: 20,
            nest_count: 2,
            ant_count_per_nest: 8,
            seed: Some(1234),
            food_density: 0.05,
            food_per_new_ant: 10.0,
            ..Default::default()
        };

        let mut a = Simulation::new(config.clone()).unwrap();
        let mut b = Simulation::new(config).unwrap();

        for _ in 0..60 {
            a.tick();
            b.tick();
            assert_eq!(a.ants(), b.ants());
            assert_eq!(a.grid(), b.grid());
            assert_eq!(a.nests(), b.nests());
            assert_eq!(a.food_count(), b.food_count());
        }
    }

    #[test]
    fn test_food_counter_tracks_tiles_with_fractional_regrowth() {
        let config = SimulationConfig {
            rows: 40,
            columns: 40,
            seed: Some(5),
            hunger_to_die: 1e9,
            food_density: 0.05,
            ..Default::default()
        };
        assert_eq!(config.food_resupply_rate, 0.1);
        let mut sim = Simulation::new(config).unwrap();

        for _ in 0..20 {
            sim.run(100);
            assert_invariants(&sim);
            assert_eq!(sim.food_count(), sim.grid().total_food());
        }
    }

    #[test]
    fn test_generate_requires_empty_world() {
        let mut sim = Simulation::blank(quiet_config(1, 1)).unwrap();
        sim.place_nest(Position::new(0, 0)).unwrap();
        assert!(matches!(sim.generate(1, 3), Err(Error::InvalidState(_))));

        let mut sim = Simulation::blank(quiet_config(3, 3)).unwrap();
        sim.place_food(Position::new(1, 1), 5.0).unwrap();
        assert!(matches!(sim.generate(1, 3), Err(Error::InvalidState(_))));

        let mut sim = Simulation::blank(quiet_config(1, 1)).unwrap();
        assert!(matches!(
            sim.generate(MAX_NESTS + 1, 1),
            Err(Error::TooManyNests { .. })
        ));

        let mut sim = Simulation::blank(quiet_config(1, 1)).unwrap();
        assert!(matches!(sim.generate(2, 1), Err(Error::Configuration(_))));

        let mut sim = Simulation::blank(quiet_config(2, 2)).unwrap();
        sim.generate(1, 3).unwrap();
        assert_eq!(sim.ants().len(), 3);
        assert!(sim.generate(1, 3).is_err());
    }

    #[test]
    fn test_invariants_hold_over_a_busy_run() {
        let config = SimulationConfig {
            rows: 25,
            columns: 25,
            nest_count: 2,
            ant_count_per_nest: 15,
            seed: Some(99),
            hunger_increase_per_tick: 1.0,
            hunger_to_die: 40.0,
            food_resupply_rate: 1.0,
            food_per_new_ant: 5.0,
            food_density: 0.08,
            falloff_rate: 0.05,
            ..Default::default()
        };
        let mut sim = Simulation::new(config).unwrap();

        for _ in 0..150 {
            sim.tick();
            assert_invariants(&sim);
        }

        let stats = sim.stats();
        assert_eq!(stats.tick, 150);
        assert!(stats.deaths > 0);
        assert_eq!(stats.ant_count, sim.ants().len());
    }
}
