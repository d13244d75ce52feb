//! Thread-safe handle to a running simulation.
//!
//! Structural state sits behind one mutex. Scalars that observers poll every
//! frame live in atomics and never need the lock.

use crate::scalars::SharedScalars;
use crate::simulation::Simulation;
use antsim_core::{FoodAmount, MouseLocation, Result, RunState, SimulationConfig, Tick};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Clone)]
pub struct SharedSimulation {
    inner: Arc<Mutex<Simulation>>,
    scalars: Arc<SharedScalars>,
}

impl SharedSimulation {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Ok(Self::from_simulation(Simulation::new(config)?))
    }

    pub fn from_simulation(simulation: Simulation) -> Self {
        let scalars = Arc::clone(simulation.scalars());
        Self {
            inner: Arc::new(Mutex::new(simulation)),
            scalars,
        }
    }

    /// Block until the structural state is available
    pub fn lock(&self) -> MutexGuard<'_, Simulation> {
        self.inner.lock()
    }

    pub fn try_lock(&self) -> Option<MutexGuard<'_, Simulation>> {
        self.inner.try_lock()
    }

    /// Run one tick under the lock
    pub fn tick(&self) -> bool {
        self.inner.lock().tick()
    }

    pub fn scalars(&self) -> &Arc<SharedScalars> {
        &self.scalars
    }

    pub fn state(&self) -> RunState {
        self.scalars.state()
    }

    pub fn set_state(&self, state: RunState) -> bool {
        self.scalars.set_state(state)
    }

    pub fn pause(&self, paused: bool) -> bool {
        let state = if paused {
            RunState::Paused
        } else {
            RunState::Running
        };
        self.scalars.set_state(state)
    }

    pub fn paused(&self) -> bool {
        self.scalars.state() == RunState::Paused
    }

    /// Let exactly one more tick run, then pause
    pub fn single_step(&self) -> bool {
        self.scalars.set_state(RunState::SingleStep)
    }

    pub fn stop(&self) {
        self.scalars.set_state(RunState::Stopped);
    }

    pub fn stopped(&self) -> bool {
        self.scalars.state() == RunState::Stopped
    }

    pub fn tick_count(&self) -> Tick {
        self.scalars.tick_count()
    }

    pub fn food_count(&self) -> FoodAmount {
        self.scalars.food_count()
    }

    pub fn mouse_location(&self) -> MouseLocation {
        self.scalars.mouse_location()
    }

    pub fn set_mouse_location(&self, location: MouseLocation) {
        self.scalars.set_mouse_location(location)
    }

    pub fn log_ant_movements(&self) -> bool {
        self.scalars.log_ant_movements()
    }

    pub fn set_log_ant_movements(&self, enabled: bool) {
        self.scalars.set_log_ant_movements(enabled)
    }

    pub fn log_ant_state_changes(&self) -> bool {
        self.scalars.log_ant_state_changes()
    }

    pub fn set_log_ant_state_changes(&self, enabled: bool) {
        self.scalars.set_log_ant_state_changes(enabled)
    }

    /// Start the tick loop on its own thread. The loop ends once the run state
    /// is `Stopped`, which it also sets itself after `max_ticks` ticks.
    pub fn spawn_engine(&self, options: EngineOptions) -> std::io::Result<JoinHandle<()>> {
        let shared = self.clone();

        std::thread::Builder::new()
            .name("antsim-engine".to_string())
            .spawn(move || shared.run_engine(options))
    }

    fn run_engine(&self, options: EngineOptions) {
        info!(
            event = "engine_started",
            tick_interval_ms = options.tick_interval.as_millis() as u64,
            max_ticks = ?options.max_ticks,
            "Engine started"
        );

        while !self.stopped() {
            {
                let mut simulation = self.inner.lock();

                if let Some(max_ticks) = options.max_ticks {
                    if u64::from(simulation.tick_count()) >= max_ticks {
                        debug!(event = "tick_limit_reached", max_ticks = max_ticks);
                        self.stop();
                        break;
                    }
                }

                simulation.tick();
            }

            std::thread::sleep(options.tick_interval);
        }

        info!(
            event = "engine_stopped",
            tick = self.tick_count(),
            "Engine stopped"
        );
    }
}

/// Pacing for the engine thread
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub tick_interval: Duration,
    pub max_ticks: Option<u64>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(50),
            max_ticks: None,
        }
    }
}
