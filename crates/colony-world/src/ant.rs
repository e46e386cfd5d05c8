//! Ant behavior: probabilistic pickup/drop followed by a move.

use crate::neighborhood::Evaluator;
use crate::world::World;
use colony_core::entropy::{drop_probability, pickup_probability};
use colony_core::{ClusteringConfig, EntityId, Error, MovementPolicy, Position, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::fmt::Debug;
use tracing::trace;

/// Radius within which an idle ant looks for something to lift
const PICKUP_RADIUS: i32 = 1;

/// What an ant intends to do with objects this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    PickUp(EntityId),
    Drop,
    Keep,
}

/// Effect of applying a [`Decision`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    PickedUp(EntityId),
    Dropped(EntityId),
    /// The chosen object had already been taken by another ant
    StalePickup(EntityId),
    Unchanged,
}

/// An ant's load once its pickup/drop decision has been applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarryState {
    pub carrying: bool,
    /// Picked up or dropped something this tick
    pub changed: bool,
}

impl CarryState {
    pub fn unchanged(carrying: bool) -> Self {
        Self {
            carrying,
            changed: false,
        }
    }

    /// State after a successful pickup or drop
    pub fn switched_to(carrying: bool) -> Self {
        Self {
            carrying,
            changed: true,
        }
    }
}

/// Chooses where an ant goes after its pickup/drop decision
pub trait Movement: Debug + Send + Sync {
    fn policy(&self) -> MovementPolicy;

    fn destination(
        &self,
        world: &World,
        ant: EntityId,
        carry: CarryState,
        rng: &mut ChaCha8Rng,
    ) -> Result<Position>;
}

/// Uniform random offset per axis
#[derive(Debug, Clone, Copy)]
pub struct RandomWalk {
    pub carry_step_bonus: i32,
    /// Reach of the move right after a pickup or drop (0 disables)
    pub jump_distance: i32,
}

impl RandomWalk {
    fn reach(&self, step_size: i32, carry: CarryState) -> i32 {
        if carry.changed && self.jump_distance > 0 {
            self.jump_distance
        } else if carry.carrying {
            step_size + self.carry_step_bonus
        } else {
            step_size
        }
    }
}

impl Movement for RandomWalk {
    fn policy(&self) -> MovementPolicy {
        MovementPolicy::RandomWalk
    }

    fn destination(
        &self,
        world: &World,
        ant: EntityId,
        carry: CarryState,
        rng: &mut ChaCha8Rng,
    ) -> Result<Position> {
        let pos = world.placed_position(ant)?;
        let reach = self.reach(world.ant(ant)?.step_size, carry);
        let dx = rng.gen_range(-reach..=reach);
        let dy = rng.gen_range(-reach..=reach);
        Ok(world.grid().normalize(pos.add(dx, dy)))
    }
}

/// Greedy move towards the empty neighbor cell with the lowest neighbor entropy
#[derive(Debug, Clone, Copy)]
pub struct EntropyDescent {
    evaluator: Evaluator,
}

impl EntropyDescent {
    pub fn new(evaluator: Evaluator) -> Self {
        Self { evaluator }
    }
}

impl Movement for EntropyDescent {
    fn policy(&self) -> MovementPolicy {
        MovementPolicy::EntropyDescent
    }

    fn destination(
        &self,
        world: &World,
        ant: EntityId,
        _carry: CarryState,
        rng: &mut ChaCha8Rng,
    ) -> Result<Position> {
        let pos = world.placed_position(ant)?;
        let grid = world.grid();
        let mut lowest = self.evaluator.entropy_at(world, pos);
        let mut best = None;

        // ants are not objects, so standing on a candidate cell does not
        // change its neighbor entropy
        for cell in grid.neighborhood(pos, self.evaluator.radius(), false) {
            if !grid.is_empty(cell) {
                continue;
            }
            let entropy = self.evaluator.entropy_at(world, cell);
            if entropy < lowest {
                lowest = entropy;
                best = Some(cell);
            }
        }

        match best {
            Some(cell) => Ok(cell),
            None => grid.random_empty_cell(rng),
        }
    }
}

pub fn movement_for(config: &ClusteringConfig) -> Box<dyn Movement> {
    match config.movement {
        MovementPolicy::RandomWalk => Box::new(RandomWalk {
            carry_step_bonus: config.carry_step_bonus,
            jump_distance: config.jump_distance,
        }),
        MovementPolicy::EntropyDescent => Box::new(EntropyDescent::new(Evaluator::new(config))),
    }
}

/// Per-ant state machine: Idle <-> Carrying
#[derive(Debug)]
pub struct Automaton {
    pickup_threshold: f64,
    drop_threshold: f64,
    evaluator: Evaluator,
    movement: Box<dyn Movement>,
}

impl Automaton {
    pub fn new(config: &ClusteringConfig) -> Self {
        Self::with_movement(config, movement_for(config))
    }

    pub fn with_movement(config: &ClusteringConfig, movement: Box<dyn Movement>) -> Self {
        Self {
            pickup_threshold: config.pickup_threshold,
            drop_threshold: config.drop_threshold,
            evaluator: Evaluator::new(config),
            movement,
        }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn movement_policy(&self) -> MovementPolicy {
        self.movement.policy()
    }

    /// Objects an idle ant could lift
    pub fn pickup_candidates(&self, world: &World, ant: EntityId) -> Result<Vec<EntityId>> {
        let pos = world.placed_position(ant)?;
        Ok(world
            .neighbor_objects(pos, PICKUP_RADIUS)
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }

    pub fn pickup_probability(&self, world: &World, ant: EntityId) -> Result<f64> {
        let similarity = self.evaluator.similarity(world, ant)?;
        Ok(pickup_probability(self.pickup_threshold, similarity))
    }

    pub fn drop_probability(&self, world: &World, ant: EntityId) -> Result<f64> {
        let similarity = self.evaluator.similarity(world, ant)?;
        Ok(drop_probability(self.drop_threshold, similarity))
    }

    /// Roll the pickup or drop transition without touching the world
    pub fn decide(&self, world: &World, ant: EntityId, rng: &mut ChaCha8Rng) -> Result<Decision> {
        if world.ant(ant)?.is_carrying() {
            let p_drop = self.drop_probability(world, ant)?;
            return Ok(if rng.gen::<f64>() < p_drop {
                Decision::Drop
            } else {
                Decision::Keep
            });
        }

        let candidates = self.pickup_candidates(world, ant)?;
        if candidates.is_empty() {
            return Ok(Decision::Keep);
        }
        let p_pick = self.pickup_probability(world, ant)?;
        if rng.gen::<f64>() < p_pick {
            if let Some(&object) = candidates.choose(rng) {
                return Ok(Decision::PickUp(object));
            }
        }
        Ok(Decision::Keep)
    }

    /// Apply a decision to the live world; a stale pickup is skipped
    pub fn apply(&self, world: &mut World, ant: EntityId, decision: Decision) -> Result<Outcome> {
        match decision {
            Decision::PickUp(object) => match world.pick_up(ant, object) {
                Ok(()) => Ok(Outcome::PickedUp(object)),
                Err(Error::StaleReference(object)) => {
                    trace!(ant = %ant, object = %object, "Pickup skipped: object already taken");
                    Ok(Outcome::StalePickup(object))
                }
                Err(e) => Err(e),
            },
            Decision::Drop => Ok(match world.drop_carried(ant)? {
                Some(object) => Outcome::Dropped(object),
                None => Outcome::Unchanged,
            }),
            Decision::Keep => Ok(Outcome::Unchanged),
        }
    }

    pub fn destination(
        &self,
        world: &World,
        ant: EntityId,
        carry: CarryState,
        rng: &mut ChaCha8Rng,
    ) -> Result<Position> {
        self.movement.destination(world, ant, carry, rng)
    }

    /// Decide, apply and move one ant against the live world
    pub fn act(&self, world: &mut World, ant: EntityId, rng: &mut ChaCha8Rng) -> Result<Outcome> {
        let decision = self.decide(world, ant, rng)?;
        let outcome = self.apply(world, ant, decision)?;
        let carry = match outcome {
            Outcome::PickedUp(_) => CarryState::switched_to(true),
            Outcome::Dropped(_) => CarryState::switched_to(false),
            Outcome::StalePickup(_) | Outcome::Unchanged => {
                CarryState::unchanged(world.ant(ant)?.is_carrying())
            }
        };
        let target = self.destination(world, ant, carry, rng)?;
        world.move_entity(ant, target)?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn config() -> ClusteringConfig {
        ClusteringConfig {
            width: 10,
            height: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_idle_ant_without_neighbors_keeps() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut world = World::new(10, 10).unwrap();
        world.spawn_object(0, Position::new(8, 8)).unwrap();
        let ant = world.spawn_ant(1, Position::new(5, 5)).unwrap();
        let automaton = Automaton::new(&config());

        for _ in 0..100 {
            assert_eq!(automaton.decide(&world, ant, &mut rng).unwrap(), Decision::Keep);
        }
    }

    #[test]
    fn test_pickup_only_adjacent_objects() {
        let mut world = World::new(10, 10).unwrap();
        let near = world.spawn_object(0, Position::new(6, 5)).unwrap();
        world.spawn_object(0, Position::new(7, 7)).unwrap();
        world.spawn_object(0, Position::new(5, 5)).unwrap();
        let ant = world.spawn_ant(1, Position::new(5, 5)).unwrap();

        let automaton = Automaton::new(&config());
        assert_eq!(automaton.pickup_candidates(&world, ant).unwrap(), vec![near]);
    }

    #[test]
    fn test_apply_stale_pickup_is_skipped() {
        let mut world = World::new(10, 10).unwrap();
        let object = world.spawn_object(0, Position::new(5, 5)).unwrap();
        let first = world.spawn_ant(1, Position::new(5, 4)).unwrap();
        let second = world.spawn_ant(1, Position::new(5, 6)).unwrap();
        let automaton = Automaton::new(&config());

        let outcome = automaton.apply(&mut world, first, Decision::PickUp(object)).unwrap();
        assert_eq!(outcome, Outcome::PickedUp(object));
        let outcome = automaton.apply(&mut world, second, Decision::PickUp(object)).unwrap();
        assert_eq!(outcome, Outcome::StalePickup(object));
        assert!(!world.ant(second).unwrap().is_carrying());
        assert!(world.verify_invariants().is_ok());
    }

    #[test]
    fn test_random_walk_stays_within_reach() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut world = World::new(20, 20).unwrap();
        let ant = world.spawn_ant(2, Position::new(10, 10)).unwrap();
        let walk = RandomWalk {
            carry_step_bonus: 3,
            jump_distance: 0,
        };

        for _ in 0..200 {
            let idle = walk
                .destination(&world, ant, CarryState::unchanged(false), &mut rng)
                .unwrap();
            assert!(idle.toroidal_chebyshev(&Position::new(10, 10), 20, 20) <= 2);
            let loaded = walk
                .destination(&world, ant, CarryState::unchanged(true), &mut rng)
                .unwrap();
            assert!(loaded.toroidal_chebyshev(&Position::new(10, 10), 20, 20) <= 5);
            // no jump configured: a pickup moves like any loaded step
            let picked = walk
                .destination(&world, ant, CarryState::switched_to(true), &mut rng)
                .unwrap();
            assert!(picked.toroidal_chebyshev(&Position::new(10, 10), 20, 20) <= 5);
        }
    }

    #[test]
    fn test_random_walk_jumps_after_pickup_or_drop() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut world = World::new(40, 40).unwrap();
        let home = Position::new(20, 20);
        let ant = world.spawn_ant(1, home).unwrap();
        let walk = RandomWalk {
            carry_step_bonus: 0,
            jump_distance: 6,
        };

        let mut farthest = 0;
        for _ in 0..500 {
            for carry in [CarryState::switched_to(true), CarryState::switched_to(false)] {
                let target = walk.destination(&world, ant, carry, &mut rng).unwrap();
                let distance = target.toroidal_chebyshev(&home, 40, 40);
                assert!(distance <= 6);
                farthest = farthest.max(distance);
            }
            let step = walk
                .destination(&world, ant, CarryState::unchanged(true), &mut rng)
                .unwrap();
            assert!(step.toroidal_chebyshev(&home, 40, 40) <= 1);
        }
        assert!(farthest > 1);
    }

    #[test]
    fn test_entropy_descent_picks_first_lowest_cell() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let config = ClusteringConfig {
            width: 20,
            height: 20,
            sigma_squared: 9.0,
            movement: MovementPolicy::EntropyDescent,
            ..Default::default()
        };
        let mut world = World::new(20, 20).unwrap();
        // mixed neighborhood around the ant
        world.spawn_object(0, Position::new(9, 10)).unwrap();
        world.spawn_object(1, Position::new(11, 10)).unwrap();
        let ant = world.spawn_ant(1, Position::new(10, 10)).unwrap();

        let automaton = Automaton::new(&config);
        assert_eq!(automaton.movement_policy(), MovementPolicy::EntropyDescent);
        let target = automaton
            .destination(&world, ant, CarryState::unchanged(false), &mut rng)
            .unwrap();
        // (9, 9) sees (9, 10) only among objects: entropy 0, first in scan order
        assert_eq!(target, Position::new(9, 9));
    }

    #[test]
    fn test_entropy_descent_tie_goes_to_lowest_x() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let config = ClusteringConfig {
            width: 20,
            height: 20,
            sigma_squared: 9.0,
            movement: MovementPolicy::EntropyDescent,
            ..Default::default()
        };
        let mut world = World::new(20, 20).unwrap();
        world.spawn_object(0, Position::new(9, 9)).unwrap();
        world.spawn_object(1, Position::new(11, 11)).unwrap();
        let ant = world.spawn_ant(1, Position::new(10, 10)).unwrap();
        // leave only (11, 9) and (9, 11) free
        for (x, y) in [(10, 9), (9, 10), (11, 10), (10, 11)] {
            world.spawn_ant(1, Position::new(x, y)).unwrap();
        }

        let automaton = Automaton::new(&config);
        let evaluator = automaton.evaluator();
        assert_eq!(evaluator.entropy_at(&world, Position::new(10, 10)), 1.0);
        assert_eq!(evaluator.entropy_at(&world, Position::new(11, 9)), 0.0);
        assert_eq!(evaluator.entropy_at(&world, Position::new(9, 11)), 0.0);

        let target = automaton
            .destination(&world, ant, CarryState::unchanged(false), &mut rng)
            .unwrap();
        assert_eq!(target, Position::new(9, 11));
    }

    #[test]
    fn test_entropy_descent_falls_back_to_random_empty_cell() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let config = ClusteringConfig {
            movement: MovementPolicy::EntropyDescent,
            ..config()
        };
        let mut world = World::new(10, 10).unwrap();
        let ant = world.spawn_ant(1, Position::new(5, 5)).unwrap();
        let automaton = Automaton::new(&config);

        // nothing strictly improves on zero entropy
        let target = automaton
            .destination(&world, ant, CarryState::unchanged(false), &mut rng)
            .unwrap();
        assert!(world.grid().is_empty(target));
    }

    #[test]
    fn test_act_moves_ant_and_keeps_invariants() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut world = World::new(10, 10).unwrap();
        for x in 0..5 {
            world.spawn_object(x as u32 % 2, Position::new(x, 4)).unwrap();
        }
        let ant = world.spawn_ant(1, Position::new(2, 5)).unwrap();
        let automaton = Automaton::new(&config());

        for _ in 0..50 {
            automaton.act(&mut world, ant, &mut rng).unwrap();
            assert!(world.verify_invariants().is_ok());
        }
    }
}
