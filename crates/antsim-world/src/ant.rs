//! Ant state and behaviour.

use crate::grid::Tile;
use crate::scalars::SharedScalars;
use crate::world::World;
use antsim_core::{
    AntId, AntState, Caste, FoodAmount, JitterConfig, NestId, PheromoneType, Position,
    SimulationConfig, Tick,
};
use rand::distributions::{Distribution, Uniform};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// Random perturbation of pheromone strengths, sampled from the engine's RNG
#[derive(Debug, Clone)]
pub struct Jitter {
    add: Uniform<f32>,
    scale: Uniform<f32>,
}

impl Jitter {
    /// The ranges must already be validated (`min <= max`)
    pub fn new(config: &JitterConfig) -> Self {
        Self {
            add: Uniform::new_inclusive(config.add_min, config.add_max),
            scale: Uniform::new_inclusive(config.scale_min, config.scale_max),
        }
    }
}

/// Everything an ant may touch while it takes its turn
pub struct TickContext<'a> {
    pub world: &'a mut World,
    pub rng: &'a mut ChaCha8Rng,
    pub config: &'a SimulationConfig,
    pub jitter: &'a Jitter,
    pub scalars: &'a SharedScalars,
    /// Nests that should receive a new worker once the ant traversal is over
    pub birth_queue: &'a mut Vec<NestId>,
    pub tick: Tick,
}

impl TickContext<'_> {
    pub fn queue_ant(&mut self, nest_id: NestId) {
        self.birth_queue.push(nest_id);
    }
}

/// An ant in the simulation
#[derive(Debug, Clone, PartialEq)]
pub struct Ant {
    pub ant_id: AntId,
    pub nest_id: NestId,
    pub caste: Caste,
    pub location: Position,
    pub state: AntState,
    pub hunger: f32,
    pub food_in_inventory: FoodAmount,
    /// Set during the tick the ant starves; the engine drops it right after
    pub dead: bool,
}

impl Ant {
    pub fn new(ant_id: AntId, nest_id: NestId, caste: Caste, location: Position) -> Self {
        Self {
            ant_id,
            nest_id,
            caste,
            location,
            state: AntState::Searching,
            hunger: 0.0,
            food_in_inventory: 0.0,
            dead: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Determine and execute this ant's action for the current tick
    pub fn tick(&mut self, ctx: &mut TickContext<'_>) {
        match self.caste {
            Caste::Queen => self.tick_queen(ctx),
            Caste::Worker => self.tick_worker(ctx),
        }
    }

    fn tick_queen(&mut self, ctx: &mut TickContext<'_>) {
        let cost = ctx.config.food_per_new_ant;
        let nest = ctx.world.nest_mut(self.nest_id);

        if nest.try_spend(cost) {
            let remaining = nest.food_supply;
            ctx.queue_ant(self.nest_id);

            debug!(
                event = "ant_birth_queued",
                queen_id = %self.ant_id,
                nest_id = %self.nest_id,
                cost = cost,
                nest_food = remaining,
                tick = ctx.tick,
                "Queen queued a new worker"
            );
        }
    }

    fn tick_worker(&mut self, ctx: &mut TickContext<'_>) {
        self.hunger += ctx.config.hunger_increase_per_tick;
        self.eat(ctx.config);

        if self.hunger >= ctx.config.hunger_to_die {
            self.die(ctx);
            return;
        }

        let new_location = self
            .calculate_next_location(ctx)
            .unwrap_or(self.location);

        self.move_to(ctx, new_location);
    }

    /// Turn carried food into reduced hunger, never below zero
    fn eat(&mut self, config: &SimulationConfig) {
        if self.food_in_inventory == 0.0 {
            return;
        }

        let food_needed = self.hunger * config.food_hunger_ratio;
        let food_eaten = self.food_in_inventory.min(food_needed);

        self.food_in_inventory -= food_eaten;
        self.hunger = (self.hunger - food_eaten / config.food_hunger_ratio).max(0.0);
    }

    fn die(&mut self, ctx: &mut TickContext<'_>) {
        debug_assert!(ctx.world.grid.get(self.location).has_ant);

        self.dead = true;
        ctx.world.vacate(self.location);

        debug!(
            event = "ant_death",
            ant_id = %self.ant_id,
            nest_id = %self.nest_id,
            x = self.location.x,
            y = self.location.y,
            hunger = self.hunger,
            tick = ctx.tick,
            "Ant starved"
        );
    }

    /// Weight of stepping onto `tile`. The tile's trails for this ant's nest
    /// must already be decayed to the current tick.
    pub fn calculate_tile_weight(
        &self,
        tile: &Tile,
        rng: &mut ChaCha8Rng,
        jitter: &Jitter,
        config: &SimulationConfig,
    ) -> f32 {
        let multiplier = match self.state {
            AntState::Searching => 1.0,
            AntState::Returning => -1.0,
        };

        // Food draws searching ants and repels returning ones
        if tile.has_food() {
            return f32::INFINITY * multiplier;
        }

        // The home nest is the mirror image of food
        if tile.is_nest_of(self.nest_id) {
            return f32::NEG_INFINITY * multiplier;
        }

        let mut type1_strength = tile.pheromones.strength(self.nest_id, PheromoneType::Outbound);
        let mut type2_strength = tile.pheromones.strength(self.nest_id, PheromoneType::Inbound);

        type1_strength += jitter.add.sample(rng);
        type2_strength += jitter.add.sample(rng);

        type1_strength *= jitter.scale.sample(rng);
        type2_strength *= jitter.scale.sample(rng);

        match self.state {
            AntState::Searching => type1_strength *= -config.type1_avoidance,
            AntState::Returning => type2_strength *= -config.type2_avoidance,
        }

        type1_strength + type2_strength
    }

    /// The neighbour this ant wants to move to, if any neighbour is free.
    /// Equal weights resolve to the earliest neighbour in enumeration order.
    pub fn calculate_next_location(&self, ctx: &mut TickContext<'_>) -> Option<Position> {
        let neighbors = ctx.world.grid.neighbors(self.location);
        let mut best: Option<(Position, f32)> = None;

        for neighbor in neighbors.into_iter().flatten() {
            let tile = ctx.world.grid.get_mut(neighbor);

            // Ignore tiles that are already full
            if tile.is_full() {
                continue;
            }

            tile.pheromones
                .update(ctx.tick, self.nest_id, ctx.config.falloff_rate);

            let weight = self.calculate_tile_weight(tile, ctx.rng, ctx.jitter, ctx.config);

            match best {
                Some((_, best_weight)) if weight <= best_weight => {}
                _ => best = Some((neighbor, weight)),
            }
        }

        let (new_location, weight) = best?;

        if ctx.scalars.log_ant_movements() {
            info!(
                event = "ant_move",
                ant_id = %self.ant_id,
                x = new_location.x,
                y = new_location.y,
                weight = weight,
                "Move"
            );
        }

        Some(new_location)
    }

    /// Move to `new_location`, laying a trail on the tile being left and
    /// picking up or dropping off food on arrival
    pub fn move_to(&mut self, ctx: &mut TickContext<'_>, new_location: Position) {
        debug_assert!(self.caste != Caste::Queen, "queens stay on their nest");

        if new_location == self.location {
            return;
        }

        let nest_id = self.nest_id;
        let falloff_rate = ctx.config.falloff_rate;

        assert!(
            !ctx.world.grid.get(new_location).is_full(),
            "ant {} cannot move onto occupied tile {}",
            self.ant_id,
            new_location
        );

        ctx.world.vacate(self.location);

        debug_assert!(
            ctx.world.grid.get(new_location).pheromones.is_current(nest_id, ctx.tick),
            "trails at {} must be decayed before ant {} moves there",
            new_location,
            self.ant_id
        );

        let current_tile = ctx.world.grid.get_mut(self.location);
        current_tile.pheromones.update(ctx.tick, nest_id, falloff_rate);
        current_tile
            .pheromones
            .deposit(nest_id, self.state.trail(), ctx.config.increase_rate);

        let new_tile = ctx.world.grid.get_mut(new_location);

        if new_tile.has_food() && self.food_in_inventory == 0.0 {
            let headroom = FoodAmount::MAX - self.food_in_inventory;
            let food_taken = ctx
                .config
                .food_taken
                .min(new_tile.food_supply)
                .min(headroom);

            let before = new_tile.food_supply;
            new_tile.food_supply -= food_taken;
            self.food_in_inventory += food_taken;
            ctx.scalars
                .adjust_food_count(f64::from(new_tile.food_supply) - f64::from(before));

            self.state = AntState::Returning;
            self.log_state_change(ctx.scalars, new_location, food_taken);
        }

        let arrived_home = new_tile.is_nest_of(nest_id);
        if arrived_home {
            let food_deposited = ctx.world.nest_mut(nest_id).deposit(self.food_in_inventory);
            self.food_in_inventory -= food_deposited;

            if self.state == AntState::Returning {
                self.state = AntState::Searching;
                self.log_state_change(ctx.scalars, new_location, food_deposited);
            }
        }

        ctx.world.occupy(new_location, self.ant_id);
        self.location = new_location;
    }

    fn log_state_change(&self, scalars: &SharedScalars, location: Position, amount: FoodAmount) {
        if scalars.log_ant_state_changes() {
            info!(
                event = "ant_state_change",
                state = %self.state,
                ant_id = %self.ant_id,
                nest_id = %self.nest_id,
                x = location.x,
                y = location.y,
                amount = amount,
                "State change"
            );
        }
    }
}
