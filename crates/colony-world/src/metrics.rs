//! Per-step entropy, emergence and population metrics.

use crate::neighborhood::Evaluator;
use crate::world::World;
use colony_core::entropy::{carry_indicator, positional_entropy};
use colony_core::{AgentKind, Attribute, EntityId, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A named scalar sampled once per step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reporter {
    AverageEntropy { kind: AgentKind, attribute: Attribute },
    Emergence { kind: AgentKind, attribute: Attribute },
    /// Objects lying on the grid
    PlacedObjects,
    CarryingAnts,
    IdleAnts,
}

impl Reporter {
    pub fn name(&self) -> String {
        match self {
            Reporter::AverageEntropy { kind, attribute } => {
                format!("{}_average_entropy_{}", kind.label(), attribute.label())
            }
            Reporter::Emergence { kind, attribute } => {
                format!("{}_emergence_{}", kind.label(), attribute.label())
            }
            Reporter::PlacedObjects => "placed_objects".to_string(),
            Reporter::CarryingAnts => "carrying_ants".to_string(),
            Reporter::IdleAnts => "idle_ants".to_string(),
        }
    }
}

pub fn default_reporters() -> Vec<Reporter> {
    use AgentKind::{Ant, Object};
    use Attribute::{Neighbors, ParticleCarried, XPosition, YPosition};

    let mut reporters: Vec<Reporter> = [XPosition, YPosition, ParticleCarried]
        .into_iter()
        .map(|attribute| Reporter::Emergence { kind: Ant, attribute })
        .collect();
    reporters.extend(
        [XPosition, YPosition, ParticleCarried]
            .into_iter()
            .map(|attribute| Reporter::AverageEntropy { kind: Ant, attribute }),
    );
    reporters.extend(
        [XPosition, YPosition, Neighbors]
            .into_iter()
            .map(|attribute| Reporter::AverageEntropy { kind: Object, attribute }),
    );
    reporters.extend([
        Reporter::PlacedObjects,
        Reporter::CarryingAnts,
        Reporter::IdleAnts,
    ]);
    reporters
}

/// Entropy of one attribute for one entity.
///
/// Carried objects have no position and report 0 for every attribute.
pub fn agent_entropy(
    world: &World,
    evaluator: &Evaluator,
    id: EntityId,
    attribute: Attribute,
) -> Result<f64> {
    let entity = world.entity(id)?;
    let position = world.position(id);

    Ok(match (attribute, position) {
        (Attribute::ParticleCarried, _) => {
            carry_indicator(entity.as_ant().map_or(false, |ant| ant.is_carrying()))
        }
        (_, None) => 0.0,
        (Attribute::XPosition, Some(pos)) => positional_entropy(pos.x),
        (Attribute::YPosition, Some(pos)) => positional_entropy(pos.y),
        (Attribute::Neighbors, Some(pos)) => evaluator.entropy_at(world, pos),
    })
}

/// Entropy of `attribute` for every entity of `kind`
pub fn attribute_entropies(
    world: &World,
    evaluator: &Evaluator,
    kind: AgentKind,
    attribute: Attribute,
) -> Result<BTreeMap<EntityId, f64>> {
    world
        .ids_of_kind(kind)
        .map(|id| -> Result<(EntityId, f64)> {
            Ok((id, agent_entropy(world, evaluator, id, attribute)?))
        })
        .collect()
}

fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// One row of the metrics table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsRow<'a> {
    pub step: u64,
    pub values: &'a [f64],
}

/// Ordered per-step samples of every reporter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsHistory {
    names: Vec<String>,
    steps: Vec<u64>,
    values: Vec<Vec<f64>>,
}

impl MetricsHistory {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            steps: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn push(&mut self, step: u64, row: Vec<f64>) {
        self.steps.push(step);
        self.values.push(row);
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// All samples of one metric, in step order
    pub fn series(&self, name: &str) -> Option<Vec<f64>> {
        let column = self.column(name)?;
        Some(self.values.iter().map(|row| row[column]).collect())
    }

    pub fn latest(&self, name: &str) -> Option<f64> {
        let column = self.column(name)?;
        self.values.last().map(|row| row[column])
    }

    pub fn rows(&self) -> impl Iterator<Item = MetricsRow<'_>> + '_ {
        self.steps
            .iter()
            .zip(&self.values)
            .map(|(&step, values)| MetricsRow {
                step,
                values: values.as_slice(),
            })
    }

    fn clear(&mut self) {
        self.steps.clear();
        self.values.clear();
    }
}

/// Samples the reporters and owns the emergence baselines
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    evaluator: Evaluator,
    reporters: Vec<Reporter>,
    baselines: HashMap<(AgentKind, Attribute), BTreeMap<EntityId, f64>>,
    history: MetricsHistory,
}

impl MetricsCollector {
    pub fn new(evaluator: Evaluator) -> Self {
        Self::with_reporters(evaluator, default_reporters())
    }

    pub fn with_reporters(evaluator: Evaluator, reporters: Vec<Reporter>) -> Self {
        let names = reporters.iter().map(Reporter::name).collect();
        Self {
            evaluator,
            reporters,
            baselines: HashMap::new(),
            history: MetricsHistory::new(names),
        }
    }

    pub fn history(&self) -> &MetricsHistory {
        &self.history
    }

    pub fn has_baseline(&self, kind: AgentKind, attribute: Attribute) -> bool {
        self.baselines.contains_key(&(kind, attribute))
    }

    pub fn average_entropy(&self, world: &World, kind: AgentKind, attribute: Attribute) -> Result<f64> {
        let entropies = attribute_entropies(world, &self.evaluator, kind, attribute)?;
        Ok(mean(entropies.into_values()))
    }

    /// Mean entropy decrease since the first call for this attribute.
    ///
    /// The first call records the baseline and returns 0. Agents missing from
    /// the baseline are left out of the mean.
    pub fn calculate_emergence(
        &mut self,
        world: &World,
        kind: AgentKind,
        attribute: Attribute,
    ) -> Result<f64> {
        let current = attribute_entropies(world, &self.evaluator, kind, attribute)?;
        let Some(baseline) = self.baselines.get(&(kind, attribute)) else {
            self.baselines.insert((kind, attribute), current);
            return Ok(0.0);
        };

        Ok(mean(current.iter().filter_map(|(id, now)| {
            baseline.get(id).map(|start| start - now)
        })))
    }

    fn sample(&mut self, world: &World, reporter: Reporter) -> Result<f64> {
        Ok(match reporter {
            Reporter::AverageEntropy { kind, attribute } => {
                self.average_entropy(world, kind, attribute)?
            }
            Reporter::Emergence { kind, attribute } => {
                self.calculate_emergence(world, kind, attribute)?
            }
            Reporter::PlacedObjects => world.placed_object_count() as f64,
            Reporter::CarryingAnts => world.carrying_count() as f64,
            Reporter::IdleAnts => (world.ant_ids().len() - world.carrying_count()) as f64,
        })
    }

    /// Sample every reporter and append one row
    pub fn collect(&mut self, world: &World, step: u64) -> Result<()> {
        let reporters = self.reporters.clone();
        let row = reporters
            .into_iter()
            .map(|reporter| self.sample(world, reporter))
            .collect::<Result<Vec<_>>>()?;
        self.history.push(step, row);
        Ok(())
    }

    /// Forget baselines and history
    pub fn reset(&mut self) {
        self.baselines.clear();
        self.history.clear();
    }
}
