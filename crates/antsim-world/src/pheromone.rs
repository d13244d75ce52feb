//! Pheromone trails and their lazy decay.
//!
//! Trails are never swept across the whole grid. Each `(nest, type)` pair keeps
//! the tick it was last brought up to date, and the decay owed since then is
//! applied when the pair is next read.

use antsim_core::{
    NestId, PheromoneStrength, PheromoneType, Tick, MAX_NESTS, PHEROMONE_TYPE_COUNT,
};

/// Per-tile trails, stored as parallel arrays indexed `[nest][type]`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PheromoneTrails {
    pub last_updated: [[Tick; PHEROMONE_TYPE_COUNT]; MAX_NESTS],
    pub strength: [[PheromoneStrength; PHEROMONE_TYPE_COUNT]; MAX_NESTS],
}

impl PheromoneTrails {
    /// Bring every trail of `nest` up to `current_tick`.
    ///
    /// Calling this again within the same tick is a no-op.
    pub fn update(&mut self, current_tick: Tick, nest: NestId, falloff_rate: f32) {
        let n = nest.index();

        for kind in PheromoneType::all() {
            let kind = kind.index();
            let last_updated = &mut self.last_updated[n][kind];
            let elapsed = current_tick.saturating_sub(*last_updated) as f32;
            *last_updated = current_tick;

            let strength = &mut self.strength[n][kind];
            let decrease = falloff_rate * elapsed;
            if decrease >= *strength {
                *strength = 0.0;
            } else {
                *strength -= decrease;
            }
        }
    }

    /// Stored strength. Only meaningful right after `update` for the same tick.
    pub fn strength(&self, nest: NestId, kind: PheromoneType) -> PheromoneStrength {
        self.strength[nest.index()][kind.index()]
    }

    pub fn deposit(&mut self, nest: NestId, kind: PheromoneType, amount: PheromoneStrength) {
        let strength = &mut self.strength[nest.index()][kind.index()];
        *strength = (*strength + amount).min(PheromoneStrength::MAX);
    }

    /// Whether every trail of `nest` has been decayed up to `tick`
    pub fn is_current(&self, nest: NestId, tick: Tick) -> bool {
        self.last_updated[nest.index()]
            .iter()
            .all(|&last| last == tick)
    }
}

/// Decay the trails of `nest_id` up to `current_tick`
pub fn update_pheromones(
    trails: &mut PheromoneTrails,
    current_tick: Tick,
    nest_id: NestId,
    falloff_rate: f32,
) {
    trails.update(current_tick, nest_id, falloff_rate);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NEST: NestId = NestId(0);

    #[test]
    fn test_decay_is_linear_in_elapsed_ticks() {
        let mut trails = PheromoneTrails::default();
        trails.deposit(NEST, PheromoneType::Outbound, 10.0);
        trails.deposit(NEST, PheromoneType::Inbound, 1.0);

        update_pheromones(&mut trails, 4, NEST, 0.5);

        assert_eq!(trails.strength(NEST, PheromoneType::Outbound), 8.0);
        assert_eq!(trails.strength(NEST, PheromoneType::Inbound), 0.0);
        assert!(trails.is_current(NEST, 4));
    }

    #[test]
    fn test_decay_clamps_at_zero() {
        let mut trails = PheromoneTrails::default();
        trails.deposit(NEST, PheromoneType::Outbound, 1.0);
        trails.update(100, NEST, 1.0);
        assert_eq!(trails.strength(NEST, PheromoneType::Outbound), 0.0);
    }

    #[test]
    fn test_nests_decay_independently() {
        let mut trails = PheromoneTrails::default();
        trails.deposit(NestId(0), PheromoneType::Outbound, 5.0);
        trails.deposit(NestId(1), PheromoneType::Outbound, 5.0);

        trails.update(3, NestId(0), 1.0);

        assert_eq!(trails.strength(NestId(0), PheromoneType::Outbound), 2.0);
        assert_eq!(trails.strength(NestId(1), PheromoneType::Outbound), 5.0);
        assert!(!trails.is_current(NestId(1), 3));
    }

    #[test]
    fn test_zero_falloff_keeps_strength() {
        let mut trails = PheromoneTrails::default();
        trails.deposit(NEST, PheromoneType::Inbound, 3.0);
        trails.update(1_000, NEST, 0.0);
        assert_eq!(trails.strength(NEST, PheromoneType::Inbound), 3.0);
    }

    proptest! {
        #[test]
        fn prop_update_is_idempotent_within_a_tick(
            initial in 0.0f32..1_000.0,
            falloff in 0.0f32..10.0,
            tick in 0u32..10_000,
        ) {
            let mut trails = PheromoneTrails::default();
            trails.deposit(NEST, PheromoneType::Outbound, initial);

            trails.update(tick, NEST, falloff);
            let once = trails;
            trails.update(tick, NEST, falloff);

            prop_assert_eq!(once, trails);
        }

        #[test]
        fn prop_strength_never_increases_without_deposit(
            initial in 0.0f32..1_000.0,
            falloff in 0.0f32..10.0,
            steps in proptest::collection::vec(0u32..50, 1..20),
        ) {
            let mut trails = PheromoneTrails::default();
            trails.deposit(NEST, PheromoneType::Inbound, initial);

            let mut tick = 0;
            let mut previous = trails.strength(NEST, PheromoneType::Inbound);
            for step in steps {
                tick += step;
                trails.update(tick, NEST, falloff);
                let current = trails.strength(NEST, PheromoneType::Inbound);
                prop_assert!(current <= previous);
                prop_assert!(current >= 0.0);
                previous = current;
            }
        }
    }
}
