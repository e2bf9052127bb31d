//! Crawler Headless Evolution Harness
//!
//! Runs a full evolution in-process and prints the fitness of every
//! generation. No rendering, no persistence.
//!
//! Usage:
//!   cargo run -p crawler-sim
//!   cargo run -p crawler-sim -- --generations 100 --seed 7
//!   cargo run -p crawler-sim -- --config run.json --json
//!   RUST_LOG=debug cargo run -p crawler-sim

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use crawler_core::prelude::*;

#[derive(Debug, Parser)]
#[command(name = "crawler-sim", about = "Evolve grid locomotion genomes")]
struct Args {
    /// JSON file with a (possibly partial) run configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Interior grid width
    #[arg(long)]
    width: Option<usize>,

    /// Initial interior grid length
    #[arg(long)]
    length: Option<usize>,

    /// Agents per generation
    #[arg(long)]
    population: Option<usize>,

    #[arg(long)]
    generations: Option<usize>,

    /// Simulation ticks per generation
    #[arg(long)]
    ticks: Option<usize>,

    /// Per-symbol mutation probability
    #[arg(long)]
    mutation_rate: Option<f64>,

    /// Rows at the top of the grid used to scatter agents
    #[arg(long)]
    spawn_rows: Option<usize>,

    /// Scatter obstacles over the grid
    #[arg(long)]
    blocking: bool,

    /// Obstacle density used with --blocking
    #[arg(long)]
    density: Option<f64>,

    /// First interior row that receives obstacles
    #[arg(long)]
    obstacle_start_row: Option<usize>,

    /// Keep the grid at its initial length
    #[arg(long)]
    no_auto_extend: bool,

    /// Reward for a successful forward move
    #[arg(long, allow_hyphen_values = true)]
    forward_reward: Option<i64>,

    /// Reward for staying or a successful sideways move
    #[arg(long, allow_hyphen_values = true)]
    turn_reward: Option<i64>,

    /// Reward for running into a standing agent
    #[arg(long, allow_hyphen_values = true)]
    collision_reward: Option<i64>,

    /// Reward for running into an obstacle or a moving agent
    #[arg(long, allow_hyphen_values = true)]
    blocked_reward: Option<i64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Print the full report as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Print the champion's genome after the run
    #[arg(long)]
    verbose: bool,
}

impl Args {
    /// Defaults, then the config file, then command-line overrides
    fn into_config(self) -> Result<EvolutionConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    ConfigError::Invalid(format!("cannot read {}: {}", path.display(), e))
                })?;
                EvolutionConfig::from_json(&text)?
            }
            None => EvolutionConfig::default(),
        };

        if let Some(v) = self.width {
            config.width = v;
        }
        if let Some(v) = self.length {
            config.length = v;
        }
        if let Some(v) = self.population {
            config.population_size = v;
        }
        if let Some(v) = self.generations {
            config.generations = v;
        }
        if let Some(v) = self.ticks {
            config.ticks_per_generation = v;
        }
        if let Some(v) = self.mutation_rate {
            config.mutation_rate = v;
        }
        if let Some(v) = self.spawn_rows {
            config.spawn_rows = Some(v);
        }
        if let Some(v) = self.density {
            config.density = v;
        }
        if let Some(v) = self.obstacle_start_row {
            config.obstacle_start_row = v;
        }
        if let Some(v) = self.forward_reward {
            config.rewards.forward = v;
        }
        if let Some(v) = self.turn_reward {
            config.rewards.turn = v;
        }
        if let Some(v) = self.collision_reward {
            config.rewards.collision = v;
        }
        if let Some(v) = self.blocked_reward {
            config.rewards.blocked = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        config.blocking |= self.blocking;
        config.auto_extend &= !self.no_auto_extend;

        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    let json = args.json;
    let verbose = args.verbose;

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "running {} generations of {} agents on a {}x{} grid (seed {})",
        config.generations,
        config.population_size,
        config.width,
        config.length,
        config.seed
    );

    let mut engine = match EvolutionEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !json {
        println!("=== Crawler Evolution ===\n");
        println!("{:>10}  {:>10}  {:>6}", "generation", "fitness", "best");
    }

    while engine.generation() < engine.config().generations {
        match engine.run_generation() {
            Ok(fitness) if !json => {
                let best = engine.champion().map(|a| a.score).unwrap_or(0);
                println!("{:>10}  {:>10.3}  {:>6}", engine.generation() - 1, fitness, best);
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("error: generation {} failed: {}", engine.generation(), e);
                return ExitCode::FAILURE;
            }
        }
    }

    let report = engine.report();
    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("error: cannot encode report: {}", e);
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    print_summary(&report, verbose);
    ExitCode::SUCCESS
}

fn print_summary(report: &EvolutionReport, verbose: bool) {
    let first = report.fitness.first().copied().unwrap_or(0.0);
    let last = report.fitness.last().copied().unwrap_or(0.0);
    let peak = report.fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    println!(
        "\n=== RESULT: {} generations, fitness {:.3} -> {:.3} (peak {:.3}) ===",
        report.fitness.len(),
        first,
        last,
        if peak.is_finite() { peak } else { 0.0 }
    );

    if let Some(champion) = &report.champion {
        println!(
            "champion: agent {} scored {} ({} forward, {} stay, {} right, {} left)",
            champion.id,
            champion.score,
            champion.genome.count(Move::Forward),
            champion.genome.count(Move::Stay),
            champion.genome.count(Move::Right),
            champion.genome.count(Move::Left),
        );
        if verbose {
            println!("genome: {}", champion.genome);
        }
    }
}
