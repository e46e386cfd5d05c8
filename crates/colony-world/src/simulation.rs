//! Simulation engine for an ant clustering run.

use crate::ant::Automaton;
use crate::metrics::{MetricsCollector, MetricsHistory};
use crate::entity::EntityKind;
use crate::scheduler::{Scheduler, StepStats};
use crate::world::World;
use colony_core::{
    Activation, ClusteringConfig, EntityId, Error, MovementPolicy, ObjectType, Placement,
    Position, Result,
};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

pub struct Simulation {
    world: World,
    automaton: Automaton,
    scheduler: Scheduler,
    metrics: MetricsCollector,
    config: ClusteringConfig,
    rng: ChaCha8Rng,
    tick: u64,
    totals: StepStats,
}

impl Simulation {
    pub fn new(config: ClusteringConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let world = populate(&config, &mut rng)?;
        let automaton = Automaton::new(&config);
        let metrics = MetricsCollector::new(*automaton.evaluator());

        info!(
            width = config.width,
            height = config.height,
            ants = config.num_ants,
            objects = world.object_count(),
            radius = config.radius(),
            movement = ?config.movement,
            activation = ?config.activation,
            "Simulation created"
        );

        Ok(Self {
            world,
            automaton,
            scheduler: Scheduler::new(config.activation),
            metrics,
            config,
            rng,
            tick: 0,
            totals: StepStats::default(),
        })
    }

    /// Wrap an existing world, e.g. a hand-built test fixture. The world
    /// must match the configured grid size; `reset()` repopulates from the
    /// configuration.
    pub fn from_world(config: ClusteringConfig, world: World) -> Result<Self> {
        config.validate()?;
        let grid = world.grid();
        if (grid.width, grid.height) != (config.width, config.height) {
            return Err(Error::InvalidConfig(format!(
                "world is {}x{} but the configuration asks for {}x{}",
                grid.width, grid.height, config.width, config.height
            )));
        }
        world.verify_invariants()?;
        let automaton = Automaton::new(&config);
        let metrics = MetricsCollector::new(*automaton.evaluator());
        Ok(Self {
            world,
            automaton,
            scheduler: Scheduler::new(config.activation),
            metrics,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            tick: 0,
            totals: StepStats::default(),
        })
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn activation(&self) -> Activation {
        self.scheduler.activation()
    }

    pub fn movement(&self) -> MovementPolicy {
        self.automaton.movement_policy()
    }

    pub fn history(&self) -> &MetricsHistory {
        self.metrics.history()
    }

    /// Counts accumulated since creation or the last reset
    pub fn totals(&self) -> StepStats {
        self.totals
    }

    /// Advance by one tick: sample metrics for the pre-step state, then
    /// activate every ant once.
    pub fn step(&mut self) -> Result<StepStats> {
        self.metrics.collect(&self.world, self.tick)?;
        let stats = self
            .scheduler
            .step(&mut self.world, &self.automaton, &mut self.rng)?;
        self.totals += stats;

        debug!(
            tick = self.tick,
            pickups = stats.pickups,
            drops = stats.drops,
            stale_pickups = stats.stale_pickups,
            carrying = self.world.carrying_count(),
            "Step complete"
        );

        self.tick += 1;
        Ok(stats)
    }

    /// Run the simulation for the specified number of ticks
    #[instrument(skip(self), fields(start_tick = self.tick))]
    pub fn run(&mut self, steps: u64) -> Result<RunSummary> {
        info!("Starting simulation for {} ticks", steps);
        let start = self.totals;
        let end_tick = self.tick + steps;

        for _ in 0..steps {
            self.step()?;

            if self.config.log_interval > 0 && self.tick % self.config.log_interval == 0 {
                info!(
                    event = "progress",
                    tick = self.tick,
                    carrying = self.world.carrying_count(),
                    placed_objects = self.world.placed_object_count(),
                    "Tick {}/{}",
                    self.tick,
                    end_tick
                );
            }
        }

        let summary = RunSummary {
            ticks: steps,
            final_tick: self.tick,
            pickups: self.totals.pickups - start.pickups,
            drops: self.totals.drops - start.drops,
            stale_pickups: self.totals.stale_pickups - start.stale_pickups,
            carrying_ants: self.world.carrying_count(),
        };

        info!(
            event = "run_summary",
            ticks = summary.ticks,
            final_tick = summary.final_tick,
            pickups = summary.pickups,
            drops = summary.drops,
            stale_pickups = summary.stale_pickups,
            carrying_ants = summary.carrying_ants,
            "🏁 Run complete"
        );

        Ok(summary)
    }

    /// Rebuild the population from the stored configuration and seed
    pub fn reset(&mut self) -> Result<()> {
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.world = populate(&self.config, &mut self.rng)?;
        self.metrics.reset();
        self.tick = 0;
        self.totals = StepStats::default();
        debug!(seed = self.config.seed, "Simulation reset");
        Ok(())
    }

    /// Read-only view of every entity for rendering
    pub fn snapshot(&self) -> Result<WorldSnapshot> {
        let entities = self
            .world
            .entities()
            .iter()
            .map(|entity| -> Result<EntitySnapshot> {
                let position = self.world.position(entity.id);
                let state = match &entity.kind {
                    EntityKind::Object(object) => EntityState::Object {
                        object_type: object.object_type,
                        carried: position.is_none(),
                    },
                    EntityKind::Ant(ant) => EntityState::Ant {
                        carrying: ant
                            .carrying
                            .map(|object| self.world.object_type(object))
                            .transpose()?,
                    },
                };
                Ok(EntitySnapshot {
                    id: entity.id,
                    position,
                    state,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(WorldSnapshot {
            tick: self.tick,
            width: self.world.grid().width,
            height: self.world.grid().height,
            entities,
        })
    }
}

/// Objects first, then ants per the placement policy.
///
/// Objects either fill each cell with probability `particle_density`
/// (column by column) or go to `num_objects` distinct random empty cells.
fn populate(config: &ClusteringConfig, rng: &mut ChaCha8Rng) -> Result<World> {
    let mut world = World::new(config.width, config.height)?;

    match config.particle_density {
        Some(density) => {
            for x in 0..config.width {
                for y in 0..config.height {
                    if rng.gen::<f64>() < density {
                        let object_type: ObjectType = rng.gen_range(0..config.num_object_types);
                        world.spawn_object(object_type, Position::new(x, y))?;
                    }
                }
            }
        }
        None => {
            for _ in 0..config.num_objects {
                let object_type: ObjectType = rng.gen_range(0..config.num_object_types);
                let pos = world.grid().random_empty_cell(rng)?;
                world.spawn_object(object_type, pos)?;
            }
        }
    }

    let center = Position::new(config.width / 2, config.height / 2);
    for _ in 0..config.num_ants {
        let pos = match config.placement {
            Placement::UniformRandom => world.grid().random_empty_cell(rng)?,
            Placement::FixedCenter => center,
        };
        world.spawn_ant(config.step_size, pos)?;
    }

    Ok(world)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub final_tick: u64,
    pub pickups: u64,
    pub drops: u64,
    pub stale_pickups: u64,
    pub carrying_ants: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityState {
    Object { object_type: ObjectType, carried: bool },
    Ant { carrying: Option<ObjectType> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    /// `None` while the entity is carried
    pub position: Option<Position>,
    pub state: EntityState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub width: i32,
    pub height: i32,
    pub entities: Vec<EntitySnapshot>,
}
