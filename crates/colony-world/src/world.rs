//! Entity arena plus the grid that locates its members.
//!
//! The grid and the ants refer to entities only by [`EntityId`]. An object is
//! either on the grid or held by exactly one ant, never both.

use crate::entity::{Ant, Entity, EntityKind};
use crate::grid::Grid;
use colony_core::{AgentKind, EntityId, Error, ObjectType, Position, Result};
use std::collections::HashSet;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct World {
    grid: Grid,
    entities: Vec<Entity>,
    ant_ids: Vec<EntityId>,
}

impl World {
    pub fn new(width: i32, height: i32) -> Result<Self> {
        Ok(Self {
            grid: Grid::new(width, height)?,
            entities: Vec::new(),
            ant_ids: Vec::new(),
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Ants in creation order
    pub fn ant_ids(&self) -> &[EntityId] {
        &self.ant_ids
    }

    pub fn object_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .iter()
            .filter(|entity| entity.as_object().is_some())
            .map(|entity| entity.id)
    }

    pub fn ids_of_kind(&self, kind: AgentKind) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .iter()
            .filter(move |entity| entity.agent_kind() == kind)
            .map(|entity| entity.id)
    }

    pub fn spawn_object(&mut self, object_type: ObjectType, pos: Position) -> Result<EntityId> {
        let id = self.next_id();
        self.grid.place(id, pos)?;
        self.entities.push(Entity::object(id, object_type));
        Ok(id)
    }

    pub fn spawn_ant(&mut self, step_size: i32, pos: Position) -> Result<EntityId> {
        let id = self.next_id();
        self.grid.place(id, pos)?;
        self.entities.push(Entity::ant(id, step_size));
        self.ant_ids.push(id);
        Ok(id)
    }

    fn next_id(&self) -> EntityId {
        EntityId(self.entities.len() as u32)
    }

    pub fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.entities.get(id.index()).ok_or(Error::UnknownEntity(id))
    }

    pub fn ant(&self, id: EntityId) -> Result<&Ant> {
        self.entity(id)?.as_ant().ok_or(Error::NotAnAnt(id))
    }

    fn ant_mut(&mut self, id: EntityId) -> Result<&mut Ant> {
        self.entities
            .get_mut(id.index())
            .ok_or(Error::UnknownEntity(id))?
            .as_ant_mut()
            .ok_or(Error::NotAnAnt(id))
    }

    pub fn object_type(&self, id: EntityId) -> Result<ObjectType> {
        self.entity(id)?
            .as_object()
            .map(|object| object.object_type)
            .ok_or(Error::NotAnObject(id))
    }

    /// Current cell, or `None` for a carried object
    pub fn position(&self, id: EntityId) -> Option<Position> {
        self.grid.position_of(id)
    }

    /// Position of an entity that must be on the grid
    pub fn placed_position(&self, id: EntityId) -> Result<Position> {
        self.position(id).ok_or(Error::NotPlaced(id))
    }

    /// Type of the object an ant holds
    pub fn carried_type(&self, ant: EntityId) -> Result<Option<ObjectType>> {
        match self.ant(ant)?.carrying {
            Some(object) => Ok(Some(self.object_type(object)?)),
            None => Ok(None),
        }
    }

    fn object_of(&self, id: EntityId) -> Option<(EntityId, ObjectType)> {
        self.entities
            .get(id.index())
            .and_then(|entity| entity.as_object())
            .map(|object| (id, object.object_type))
    }

    /// Objects lying on exactly one cell
    pub fn objects_at(&self, pos: Position) -> Vec<(EntityId, ObjectType)> {
        self.grid
            .cell_contents(pos)
            .iter()
            .filter_map(|&id| self.object_of(id))
            .collect()
    }

    /// Objects in the Moore neighborhood of `pos`, center excluded
    pub fn neighbor_objects(&self, pos: Position, radius: i32) -> Vec<(EntityId, ObjectType)> {
        self.grid
            .neighbors(pos, radius, false)
            .into_iter()
            .filter_map(|id| self.object_of(id))
            .collect()
    }

    /// Lift an object off the grid into an ant's hold.
    ///
    /// Fails with `StaleReference` if the object is no longer on the grid.
    pub fn pick_up(&mut self, ant: EntityId, object: EntityId) -> Result<()> {
        if self.ant(ant)?.is_carrying() {
            return Err(Error::AlreadyCarrying(ant));
        }
        self.object_type(object)?;
        if !self.grid.contains(object) {
            return Err(Error::StaleReference(object));
        }

        let from = self.grid.remove(object)?;
        self.ant_mut(ant)?.carrying = Some(object);
        trace!(ant = %ant, object = %object, x = from.x, y = from.y, "Object picked up");
        Ok(())
    }

    /// Put the carried object down on the ant's cell
    pub fn drop_carried(&mut self, ant: EntityId) -> Result<Option<EntityId>> {
        let Some(object) = self.ant(ant)?.carrying else {
            return Ok(None);
        };
        let pos = self.placed_position(ant)?;
        self.grid.place(object, pos)?;
        self.ant_mut(ant)?.carrying = None;
        trace!(ant = %ant, object = %object, x = pos.x, y = pos.y, "Object dropped");
        Ok(Some(object))
    }

    pub fn move_entity(&mut self, id: EntityId, pos: Position) -> Result<Position> {
        self.grid.move_to(id, pos)
    }

    pub fn carrying_count(&self) -> usize {
        self.ant_ids
            .iter()
            .filter_map(|&id| self.entities.get(id.index()))
            .filter_map(|entity| entity.as_ant())
            .filter(|ant| ant.is_carrying())
            .count()
    }

    pub fn object_count(&self) -> usize {
        self.entities.len() - self.ant_ids.len()
    }

    /// Objects currently lying on the grid
    pub fn placed_object_count(&self) -> usize {
        self.object_ids().filter(|&id| self.grid.contains(id)).count()
    }

    /// Check the occupancy and carry invariants
    pub fn verify_invariants(&self) -> Result<()> {
        let mut carried = HashSet::new();
        for &ant_id in &self.ant_ids {
            if !self.grid.contains(ant_id) {
                return Err(Error::InvariantViolation(format!("ant {ant_id} is off the grid")));
            }
            if let Some(object) = self.ant(ant_id)?.carrying {
                self.object_type(object)?;
                if self.grid.contains(object) {
                    return Err(Error::InvariantViolation(format!(
                        "object {object} is carried by {ant_id} and on the grid"
                    )));
                }
                if !carried.insert(object) {
                    return Err(Error::InvariantViolation(format!(
                        "object {object} is carried by more than one ant"
                    )));
                }
            }
        }

        for entity in &self.entities {
            if let EntityKind::Object(_) = entity.kind {
                let on_grid = self.grid.contains(entity.id);
                if on_grid == carried.contains(&entity.id) {
                    return Err(Error::InvariantViolation(format!(
                        "object {} is neither exactly on the grid nor carried",
                        entity.id
                    )));
                }
            }
        }

        let listed: usize = self.grid.iter().map(|(_, cell)| cell.len()).sum();
        if listed != self.grid.occupant_count() || listed + carried.len() != self.entities.len() {
            return Err(Error::InvariantViolation(format!(
                "{listed} grid occupants + {} carried != {} entities",
                carried.len(),
                self.entities.len()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_world() -> (World, EntityId, EntityId) {
        let mut world = World::new(10, 10).unwrap();
        let object = world.spawn_object(1, Position::new(5, 6)).unwrap();
        let ant = world.spawn_ant(1, Position::new(5, 5)).unwrap();
        (world, object, ant)
    }

    #[test]
    fn test_spawn_and_lookup() {
        let (world, object, ant) = small_world();
        assert_eq!(world.object_type(object).unwrap(), 1);
        assert_eq!(world.ant_ids(), &[ant]);
        assert_eq!(world.object_count(), 1);
        assert!(matches!(world.object_type(ant), Err(Error::NotAnObject(_))));
        assert!(matches!(world.ant(object), Err(Error::NotAnAnt(_))));
        assert!(matches!(world.entity(EntityId(99)), Err(Error::UnknownEntity(_))));
        assert!(world.verify_invariants().is_ok());
    }

    #[test]
    fn test_pick_up_and_drop() {
        let (mut world, object, ant) = small_world();

        world.pick_up(ant, object).unwrap();
        assert_eq!(world.position(object), None);
        assert_eq!(world.carried_type(ant).unwrap(), Some(1));
        assert_eq!(world.carrying_count(), 1);
        assert_eq!(world.placed_object_count(), 0);
        assert!(world.verify_invariants().is_ok());

        assert_eq!(world.drop_carried(ant).unwrap(), Some(object));
        assert_eq!(world.position(object), Some(Position::new(5, 5)));
        assert_eq!(world.carrying_count(), 0);
        assert!(world.verify_invariants().is_ok());

        assert_eq!(world.drop_carried(ant).unwrap(), None);
    }

    #[test]
    fn test_stale_pickup() {
        let mut world = World::new(10, 10).unwrap();
        let object = world.spawn_object(0, Position::new(1, 1)).unwrap();
        let first = world.spawn_ant(1, Position::new(1, 2)).unwrap();
        let second = world.spawn_ant(1, Position::new(2, 1)).unwrap();

        world.pick_up(first, object).unwrap();
        let err = world.pick_up(second, object).unwrap_err();
        assert!(matches!(err, Error::StaleReference(_)));
        assert!(err.is_recoverable());
        assert!(!world.ant(second).unwrap().is_carrying());
        assert!(world.verify_invariants().is_ok());
    }

    #[test]
    fn test_carry_at_most_one() {
        let (mut world, object, ant) = small_world();
        let other = world.spawn_object(2, Position::new(4, 4)).unwrap();
        world.pick_up(ant, object).unwrap();
        assert!(matches!(world.pick_up(ant, other), Err(Error::AlreadyCarrying(_))));
    }

    #[test]
    fn test_neighbor_objects_skip_ants_and_center() {
        let mut world = World::new(10, 10).unwrap();
        world.spawn_object(0, Position::new(5, 5)).unwrap();
        world.spawn_object(2, Position::new(6, 5)).unwrap();
        world.spawn_ant(1, Position::new(4, 5)).unwrap();

        let neighbors = world.neighbor_objects(Position::new(5, 5), 1);
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].1, 2);
        assert_eq!(world.objects_at(Position::new(5, 5)).len(), 1);
    }
}
