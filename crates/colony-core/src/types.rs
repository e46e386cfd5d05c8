//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable arena index of an entity (ant or object)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type tag of an object, in `0..K`
pub type ObjectType = u32;

/// 2D position in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Apply toroidal wrapping for given world dimensions
    pub fn wrap(&self, width: i32, height: i32) -> Self {
        Self {
            x: self.x.rem_euclid(width),
            y: self.y.rem_euclid(height),
        }
    }

    /// Chebyshev distance on a torus of the given size
    pub fn toroidal_chebyshev(&self, other: &Position, width: i32, height: i32) -> i32 {
        let dx = (self.x - other.x).rem_euclid(width);
        let dy = (self.y - other.y).rem_euclid(height);
        dx.min(width - dx).max(dy.min(height - dy))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Population filter for metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Ant,
    Object,
}

impl AgentKind {
    pub fn label(&self) -> &'static str {
        match self {
            AgentKind::Ant => "ant",
            AgentKind::Object => "object",
        }
    }
}

/// Per-agent attribute an entropy value is computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    XPosition,
    YPosition,
    ParticleCarried,
    Neighbors,
}

impl Attribute {
    pub fn label(&self) -> &'static str {
        match self {
            Attribute::XPosition => "x_position",
            Attribute::YPosition => "y_position",
            Attribute::ParticleCarried => "particle_carried",
            Attribute::Neighbors => "neighbors",
        }
    }

    pub fn all() -> [Attribute; 4] {
        [
            Attribute::XPosition,
            Attribute::YPosition,
            Attribute::ParticleCarried,
            Attribute::Neighbors,
        ]
    }
}
