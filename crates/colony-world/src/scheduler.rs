//! Activation of every ant once per tick.

use crate::ant::{Automaton, CarryState, Decision, Outcome};
use crate::world::World;
use colony_core::{Activation, EntityId, Position, Result};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Counts of what happened during one or more ticks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStats {
    pub activations: u64,
    pub pickups: u64,
    pub drops: u64,
    pub stale_pickups: u64,
}

impl StepStats {
    fn record(&mut self, outcome: Outcome) {
        self.activations += 1;
        match outcome {
            Outcome::PickedUp(_) => self.pickups += 1,
            Outcome::Dropped(_) => self.drops += 1,
            Outcome::StalePickup(_) => self.stale_pickups += 1,
            Outcome::Unchanged => {}
        }
    }
}

impl AddAssign for StepStats {
    fn add_assign(&mut self, other: Self) {
        self.activations += other.activations;
        self.pickups += other.pickups;
        self.drops += other.drops;
        self.stale_pickups += other.stale_pickups;
    }
}

/// A buffered action computed against the pre-tick world
#[derive(Debug, Clone, Copy)]
struct Plan {
    ant: EntityId,
    decision: Decision,
    target: Position,
}

#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    activation: Activation,
}

impl Scheduler {
    pub fn new(activation: Activation) -> Self {
        Self { activation }
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Activate every ant exactly once
    pub fn step(
        &self,
        world: &mut World,
        automaton: &Automaton,
        rng: &mut ChaCha8Rng,
    ) -> Result<StepStats> {
        match self.activation {
            Activation::Sequential => self.step_sequential(world, automaton, rng),
            Activation::Simultaneous => self.step_simultaneous(world, automaton, rng),
        }
    }

    fn step_sequential(
        &self,
        world: &mut World,
        automaton: &Automaton,
        rng: &mut ChaCha8Rng,
    ) -> Result<StepStats> {
        // Shuffle for fairness
        let mut order = world.ant_ids().to_vec();
        order.shuffle(rng);

        let mut stats = StepStats::default();
        for ant in order {
            stats.record(automaton.act(world, ant, rng)?);
        }
        Ok(stats)
    }

    /// Plan every ant against the frozen world, then commit in creation order
    fn step_simultaneous(
        &self,
        world: &mut World,
        automaton: &Automaton,
        rng: &mut ChaCha8Rng,
    ) -> Result<StepStats> {
        let frozen: &World = world;
        let plans = frozen
            .ant_ids()
            .iter()
            .map(|&ant| -> Result<Plan> {
                let decision = automaton.decide(frozen, ant, rng)?;
                let carry = match decision {
                    Decision::PickUp(_) => CarryState::switched_to(true),
                    Decision::Drop => CarryState::switched_to(false),
                    Decision::Keep => CarryState::unchanged(frozen.ant(ant)?.is_carrying()),
                };
                let target = automaton.destination(frozen, ant, carry, rng)?;
                Ok(Plan {
                    ant,
                    decision,
                    target,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut stats = StepStats::default();
        for plan in plans {
            stats.record(automaton.apply(world, plan.ant, plan.decision)?);
            world.move_entity(plan.ant, plan.target)?;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colony_core::ClusteringConfig;
    use rand::SeedableRng;

    fn crowded_world() -> World {
        let mut world = World::new(8, 8).unwrap();
        // one object surrounded by ants that all want it
        world.spawn_object(0, Position::new(4, 4)).unwrap();
        for (x, y) in [(3, 3), (4, 3), (5, 3), (3, 4), (5, 4), (3, 5), (4, 5), (5, 5)] {
            world.spawn_ant(1, Position::new(x, y)).unwrap();
        }
        world
    }

    #[test]
    fn test_every_ant_activated_once() {
        let config = ClusteringConfig::default();
        let automaton = Automaton::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        for activation in [Activation::Sequential, Activation::Simultaneous] {
            let mut world = crowded_world();
            let stats = Scheduler::new(activation)
                .step(&mut world, &automaton, &mut rng)
                .unwrap();
            assert_eq!(stats.activations, 8);
            assert!(world.verify_invariants().is_ok());
        }
    }

    #[test]
    fn test_simultaneous_contention_resolves_to_one_carrier() {
        // a huge k+ makes every ant's pickup roll succeed
        let config = ClusteringConfig {
            pickup_threshold: 1e9,
            ..Default::default()
        };
        let automaton = Automaton::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut world = crowded_world();

        let stats = Scheduler::new(Activation::Simultaneous)
            .step(&mut world, &automaton, &mut rng)
            .unwrap();

        assert_eq!(stats.pickups, 1);
        assert_eq!(stats.stale_pickups, 7);
        assert_eq!(world.carrying_count(), 1);
        assert!(world.verify_invariants().is_ok());
    }

    #[test]
    fn test_sequential_later_ants_see_earlier_pickup() {
        let config = ClusteringConfig {
            pickup_threshold: 1e9,
            ..Default::default()
        };
        let automaton = Automaton::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut world = crowded_world();

        let stats = Scheduler::new(Activation::Sequential)
            .step(&mut world, &automaton, &mut rng)
            .unwrap();

        // once the object is gone no other ant can even attempt it
        assert_eq!(stats.pickups, 1);
        assert_eq!(stats.stale_pickups, 0);
        assert_eq!(world.carrying_count(), 1);
    }

    #[test]
    fn test_stats_accumulate() {
        let mut total = StepStats::default();
        total += StepStats {
            activations: 2,
            pickups: 1,
            drops: 0,
            stale_pickups: 1,
        };
        total += StepStats {
            activations: 2,
            pickups: 0,
            drops: 1,
            stale_pickups: 0,
        };
        assert_eq!(total.activations, 4);
        assert_eq!(total.pickups, 1);
        assert_eq!(total.drops, 1);
        assert_eq!(total.stale_pickups, 1);
    }
}
