//! Scalars read by observers without taking the simulation lock.
//!
//! Each field is its own atomic. A reader may see the tick count of one tick
//! and the food count of the next, but never half of a single value.
//!
//! The food count is accumulated as an `f64`. Every tile holds an `f32`, so the
//! running total of their changes stays exact and matches the tile sum.

use antsim_core::{FoodAmount, MouseLocation, RunState, Tick};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};

#[derive(Debug, Default)]
pub struct SharedScalars {
    state: AtomicU8,
    tick_count: AtomicU32,
    mouse_location: AtomicU64,
    food_count: AtomicU64,
    log_ant_movements: AtomicBool,
    log_ant_state_changes: AtomicBool,
}

impl SharedScalars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::Acquire)).unwrap_or(RunState::Stopped)
    }

    /// Change the run state. Returns false when the simulation is already stopped,
    /// since stopping is final.
    pub fn set_state(&self, new_state: RunState) -> bool {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != RunState::Stopped.as_u8()).then_some(new_state.as_u8())
            })
            .is_ok()
    }

    /// Replace `from` with `to` only if the state is still `from`
    pub fn transition(&self, from: RunState, to: RunState) -> bool {
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn tick_count(&self) -> Tick {
        self.tick_count.load(Ordering::Acquire)
    }

    pub(crate) fn increment_tick(&self) -> Tick {
        self.tick_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn mouse_location(&self) -> MouseLocation {
        MouseLocation::from_bits(self.mouse_location.load(Ordering::Relaxed))
    }

    pub fn set_mouse_location(&self, location: MouseLocation) {
        self.mouse_location.store(location.to_bits(), Ordering::Relaxed);
    }

    pub fn food_count(&self) -> FoodAmount {
        self.food_count_exact() as FoodAmount
    }

    pub fn food_count_exact(&self) -> f64 {
        f64::from_bits(self.food_count.load(Ordering::Acquire))
    }

    /// Add `delta` (possibly negative) to the global food count
    pub(crate) fn adjust_food_count(&self, delta: f64) {
        let _ = self
            .food_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f64::from_bits(bits) + delta).to_bits())
            });
    }

    pub fn log_ant_movements(&self) -> bool {
        self.log_ant_movements.load(Ordering::Relaxed)
    }

    pub fn set_log_ant_movements(&self, enabled: bool) {
        self.log_ant_movements.store(enabled, Ordering::Relaxed);
    }

    pub fn log_ant_state_changes(&self) -> bool {
        self.log_ant_state_changes.load(Ordering::Relaxed)
    }

    pub fn set_log_ant_state_changes(&self, enabled: bool) {
        self.log_ant_state_changes.store(enabled, Ordering::Relaxed);
    }
}
