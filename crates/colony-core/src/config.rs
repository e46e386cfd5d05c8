//! Configuration types for the simulation.

use crate::entropy::neighborhood_radius;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// How an ant chooses its next cell after the pickup/drop decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementPolicy {
    /// Uniform random offset of up to `step_size` per axis
    #[default]
    RandomWalk,
    /// Move to the empty neighbor cell with the lowest neighbor entropy
    EntropyDescent,
}

/// Order in which ants are activated within one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// Shuffled order, each action applied before the next ant acts
    #[default]
    Sequential,
    /// All ants plan against the pre-tick world, then commit together
    Simultaneous,
}

/// Where ants start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    #[default]
    UniformRandom,
    /// Every ant starts on the center cell
    FixedCenter,
}

/// Clustering model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Width of the world grid
    pub width: i32,
    /// Height of the world grid
    pub height: i32,
    /// Number of ants
    pub num_ants: usize,
    /// Number of objects
    pub num_objects: usize,
    /// Per-cell probability of starting with an object; replaces
    /// `num_objects` when set
    pub particle_density: Option<f64>,
    /// Number of distinct object types (K)
    pub num_object_types: u32,
    /// Pickup threshold k+
    pub pickup_threshold: f64,
    /// Drop threshold k-
    pub drop_threshold: f64,
    /// Dissimilarity scale
    pub alpha: f64,
    /// Neighborhood size; drives the neighborhood radius
    pub sigma_squared: f64,
    /// Maximum per-axis displacement of a random-walk move
    pub step_size: i32,
    /// Extra displacement allowed while carrying
    pub carry_step_bonus: i32,
    /// Random-walk reach right after a pickup or drop (0 disables)
    pub jump_distance: i32,
    pub movement: MovementPolicy,
    pub activation: Activation,
    pub placement: Placement,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Progress log interval in ticks (0 disables)
    pub log_interval: u64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            width: 50,
            height: 50,
            num_ants: 100,
            num_objects: 250,
            particle_density: None,
            num_object_types: 3,
            pickup_threshold: 0.1,
            drop_threshold: 0.3,
            alpha: 0.5,
            sigma_squared: 25.0,
            step_size: 1,
            carry_step_bonus: 0,
            jump_distance: 0,
            movement: MovementPolicy::default(),
            activation: Activation::default(),
            placement: Placement::default(),
            seed: 0,
            log_interval: 100,
        }
    }
}

impl ClusteringConfig {
    /// Moore neighborhood radius derived from `sigma_squared`
    pub fn radius(&self) -> i32 {
        neighborhood_radius(self.sigma_squared)
    }

    /// Number of grid cells, if it fits the grid's `i32` indexing
    pub fn cell_count(&self) -> Option<usize> {
        let width = usize::try_from(self.width).ok()?;
        let height = usize::try_from(self.height).ok()?;
        width
            .checked_mul(height)
            .filter(|&cells| cells <= i32::MAX as usize)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(Error::InvalidConfig(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.cell_count().is_none() {
            return Err(Error::InvalidConfig(format!(
                "grid {}x{} has too many cells",
                self.width, self.height
            )));
        }
        if self.num_object_types == 0 {
            return Err(Error::InvalidConfig(
                "num_object_types must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("pickup_threshold", self.pickup_threshold),
            ("drop_threshold", self.drop_threshold),
            ("alpha", self.alpha),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if !(self.sigma_squared.is_finite() && self.sigma_squared >= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "sigma_squared must be at least 1, got {}",
                self.sigma_squared
            )));
        }
        if self.step_size < 0 || self.carry_step_bonus < 0 || self.jump_distance < 0 {
            return Err(Error::InvalidConfig(
                "step_size, carry_step_bonus and jump_distance must not be negative".to_string(),
            ));
        }
        if let Some(density) = self.particle_density {
            if !(0.0..=1.0).contains(&density) {
                return Err(Error::InvalidConfig(format!(
                    "particle_density must be within [0, 1], got {density}"
                )));
            }
        }

        if self.radius() == 0 {
            warn!(
                sigma_squared = self.sigma_squared,
                "Neighborhood radius is 0; similarity will always be 0"
            );
        }

        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
