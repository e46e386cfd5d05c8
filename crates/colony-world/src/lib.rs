//! Ant clustering simulation engine.
//!
//! Ants wander a toroidal grid of typed objects, picking objects up where
//! their neighborhood is dissimilar and dropping them where it is similar.

pub mod ant;
pub mod entity;
pub mod grid;
pub mod metrics;
pub mod neighborhood;
pub mod scheduler;
pub mod simulation;
pub mod world;

pub use ant::{Automaton, CarryState, Decision, Movement, Outcome};
pub use entity::{Ant, Entity, EntityKind, Object};
pub use grid::Grid;
pub use metrics::{MetricsCollector, MetricsHistory, Reporter};
pub use neighborhood::Evaluator;
pub use scheduler::{Scheduler, StepStats};
pub use simulation::{EntitySnapshot, EntityState, RunSummary, Simulation, WorldSnapshot};
pub use world::World;
