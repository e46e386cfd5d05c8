//! Local similarity and entropy around a cell.

use crate::world::World;
use colony_core::entropy::{neighborhood_similarity, shannon_entropy};
use colony_core::{ClusteringConfig, EntityId, ObjectType, Position, Result};

/// Evaluates the similarity score f* and neighbor entropy for a world
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    alpha: f64,
    sigma_squared: f64,
    radius: i32,
}

impl Evaluator {
    pub fn new(config: &ClusteringConfig) -> Self {
        Self {
            alpha: config.alpha,
            sigma_squared: config.sigma_squared,
            radius: config.radius(),
        }
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Type an ant compares its neighbors against: the carried object, else
    /// the first object on the ant's own cell.
    pub fn reference_type(&self, world: &World, ant: EntityId) -> Result<Option<ObjectType>> {
        if let Some(carried) = world.carried_type(ant)? {
            return Ok(Some(carried));
        }
        let pos = world.placed_position(ant)?;
        Ok(world.objects_at(pos).first().map(|&(_, object_type)| object_type))
    }

    /// Similarity score f* for an ant at its current cell
    pub fn similarity(&self, world: &World, ant: EntityId) -> Result<f64> {
        let pos = world.placed_position(ant)?;
        let reference = self.reference_type(world, ant)?;
        Ok(self.similarity_at(world, pos, reference))
    }

    pub fn similarity_at(&self, world: &World, pos: Position, reference: Option<ObjectType>) -> f64 {
        let neighbors = world.neighbor_objects(pos, self.radius);
        neighborhood_similarity(
            reference,
            neighbors.into_iter().map(|(_, object_type)| object_type),
            self.alpha,
            self.sigma_squared,
        )
    }

    /// Shannon entropy of object types around `pos`, center excluded
    pub fn entropy_at(&self, world: &World, pos: Position) -> f64 {
        shannon_entropy(
            world
                .neighbor_objects(pos, self.radius)
                .into_iter()
                .map(|(_, object_type)| object_type),
        )
    }
}
