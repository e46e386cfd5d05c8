//! Error types for the simulation.

use crate::types::{EntityId, Position};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid position {0}")]
    InvalidPosition(Position),

    #[error("Entity {0} is not placed on the grid")]
    NotPlaced(EntityId),

    #[error("Entity {0} is already placed on the grid")]
    AlreadyPlaced(EntityId),

    #[error("Grid is full: no empty cell available")]
    GridFull,

    #[error("Object {0} was already taken")]
    StaleReference(EntityId),

    #[error("Unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("Entity {0} is not an ant")]
    NotAnAnt(EntityId),

    #[error("Entity {0} is not an object")]
    NotAnObject(EntityId),

    #[error("Ant {0} is already carrying an object")]
    AlreadyCarrying(EntityId),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether the engine may recover from this error by skipping the action
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::StaleReference(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
