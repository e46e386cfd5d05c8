//! Command line driver for ant clustering runs.

mod telemetry;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colony_core::{Activation, ClusteringConfig, MovementPolicy, Placement};
use colony_world::{MetricsHistory, RunSummary, Simulation, WorldSnapshot};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "colony-runner",
    version,
    about = "Run an ant clustering simulation and report its metrics",
    long_about = None
)]
struct Cli {
    /// JSON configuration file (missing fields use defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of ticks to run
    #[arg(short, long, default_value_t = 1_000)]
    steps: u64,
    /// Override the configured random seed
    #[arg(long)]
    seed: Option<u64>,
    /// Override the movement policy
    #[arg(long, value_enum)]
    movement: Option<MovementArg>,
    /// Override the activation discipline
    #[arg(long, value_enum)]
    activation: Option<ActivationArg>,
    /// Start every ant on the center cell
    #[arg(long)]
    center: bool,
    /// Fill each cell with an object with this probability instead of
    /// placing a fixed number of objects
    #[arg(long)]
    density: Option<f64>,
    /// Random-walk reach right after a pickup or drop
    #[arg(long)]
    jump_distance: Option<i32>,
    /// Write the metrics report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Include the final entity snapshot in the report
    #[arg(long)]
    snapshot: bool,
    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum MovementArg {
    RandomWalk,
    EntropyDescent,
}

impl From<MovementArg> for MovementPolicy {
    fn from(arg: MovementArg) -> Self {
        match arg {
            MovementArg::RandomWalk => MovementPolicy::RandomWalk,
            MovementArg::EntropyDescent => MovementPolicy::EntropyDescent,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ActivationArg {
    Sequential,
    Simultaneous,
}

impl From<ActivationArg> for Activation {
    fn from(arg: ActivationArg) -> Self {
        match arg {
            ActivationArg::Sequential => Activation::Sequential,
            ActivationArg::Simultaneous => Activation::Simultaneous,
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    config: &'a ClusteringConfig,
    summary: RunSummary,
    history: &'a MetricsHistory,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<WorldSnapshot>,
}

fn load_config(cli: &Cli) -> Result<ClusteringConfig> {
    let mut config = match &cli.config {
        Some(path) => ClusteringConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ClusteringConfig::default(),
    };

    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(movement) = cli.movement {
        config.movement = movement.into();
    }
    if let Some(activation) = cli.activation {
        config.activation = activation.into();
    }
    if cli.center {
        config.placement = Placement::FixedCenter;
    }
    if let Some(density) = cli.density {
        config.particle_density = Some(density);
    }
    if let Some(jump_distance) = cli.jump_distance {
        config.jump_distance = jump_distance;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_telemetry(cli.log_json)?;

    let config = load_config(&cli)?;
    info!(seed = config.seed, steps = cli.steps, "Starting ant clustering run");

    let mut simulation = Simulation::new(config)?;
    let summary = simulation.run(cli.steps)?;

    let report = Report {
        config: simulation.config(),
        summary,
        history: simulation.history(),
        snapshot: cli.snapshot.then(|| simulation.snapshot()).transpose()?,
    };
    let json = serde_json::to_string_pretty(&report)?;

    match &cli.output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "colony-runner",
            "--steps",
            "5",
            "--seed",
            "17",
            "--movement",
            "entropy-descent",
            "--activation",
            "simultaneous",
            "--center",
            "--density",
            "0.1",
            "--jump-distance",
            "5",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(cli.steps, 5);
        assert_eq!(config.seed, 17);
        assert_eq!(config.movement, MovementPolicy::EntropyDescent);
        assert_eq!(config.activation, Activation::Simultaneous);
        assert_eq!(config.placement, Placement::FixedCenter);
        assert_eq!(config.particle_density, Some(0.1));
        assert_eq!(config.jump_distance, 5);
    }

    #[test]
    fn test_cli_rejects_out_of_range_density() {
        let cli = Cli::parse_from(["colony-runner", "--density", "2"]);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn test_report_serializes() {
        let config = ClusteringConfig {
            width: 12,
            height: 12,
            num_ants: 4,
            num_objects: 20,
            ..Default::default()
        };
        let mut simulation = Simulation::new(config).unwrap();
        let summary = simulation.run(3).unwrap();
        let report = Report {
            config: simulation.config(),
            summary,
            history: simulation.history(),
            snapshot: None,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"history\""));
        assert!(!json.contains("\"snapshot\""));
    }
}
