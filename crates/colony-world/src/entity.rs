//! Entity model: passive objects and mobile ants.

use colony_core::{AgentKind, EntityId, ObjectType};
use serde::{Deserialize, Serialize};

/// An inert, typed object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    pub object_type: ObjectType,
}

/// A mobile ant that may carry one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ant {
    pub carrying: Option<EntityId>,
    pub step_size: i32,
}

impl Ant {
    pub fn new(step_size: i32) -> Self {
        Self {
            carrying: None,
            step_size,
        }
    }

    pub fn is_carrying(&self) -> bool {
        self.carrying.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    Object(Object),
    Ant(Ant),
}

/// An entry in the entity arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
}

impl Entity {
    pub fn object(id: EntityId, object_type: ObjectType) -> Self {
        Self {
            id,
            kind: EntityKind::Object(Object { object_type }),
        }
    }

    pub fn ant(id: EntityId, step_size: i32) -> Self {
        Self {
            id,
            kind: EntityKind::Ant(Ant::new(step_size)),
        }
    }

    pub fn agent_kind(&self) -> AgentKind {
        match self.kind {
            EntityKind::Object(_) => AgentKind::Object,
            EntityKind::Ant(_) => AgentKind::Ant,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match &self.kind {
            EntityKind::Object(object) => Some(object),
            EntityKind::Ant(_) => None,
        }
    }

    pub fn as_ant(&self) -> Option<&Ant> {
        match &self.kind {
            EntityKind::Ant(ant) => Some(ant),
            EntityKind::Object(_) => None,
        }
    }

    pub fn as_ant_mut(&mut self) -> Option<&mut Ant> {
        match &mut self.kind {
            EntityKind::Ant(ant) => Some(ant),
            EntityKind::Object(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_creation() {
        let object = Entity::object(EntityId(0), 2);
        assert_eq!(object.agent_kind(), AgentKind::Object);
        assert_eq!(object.as_object().unwrap().object_type, 2);
        assert!(object.as_ant().is_none());

        let ant = Entity::ant(EntityId(1), 3);
        assert_eq!(ant.agent_kind(), AgentKind::Ant);
        assert_eq!(ant.as_ant().unwrap().step_size, 3);
        assert!(!ant.as_ant().unwrap().is_carrying());
    }

    #[test]
    fn test_ant_carry_state() {
        let mut ant = Entity::ant(EntityId(1), 1);
        ant.as_ant_mut().unwrap().carrying = Some(EntityId(0));
        assert!(ant.as_ant().unwrap().is_carrying());
    }
}
