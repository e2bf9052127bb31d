//! Crawler Core - evolved locomotion on a growing grid
//!
//! Agents walk across a 2D grid driven by a genome that maps each of the 256
//! possible 8-bit sensor patterns to a move. A population is scored by how far
//! forward its agents get, then bred into the next generation with
//! fitness-proportionate selection, single-point crossover and per-symbol
//! mutation.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`components`] | Moves, genomes, agents, cells and coordinates (plain data) |
//! | [`systems`] | Per-tick sensing and movement resolution |
//! | [`grid`] | Padded grid: placement, obstacles, growth, lookups, rendering |
//! | [`evolution`] | Populations, breeding and the mutation probability table |
//! | [`engine`] | Generation loop tying the grid and the evolution together |
//! | [`config`] | Rewards, step options and run configuration |
//! | [`error`] | Error types |
//!
//! # Example
//!
//! ```rust,no_run
//! use crawler_core::prelude::*;
//!
//! let config = EvolutionConfig {
//!     generations: 50,
//!     ..Default::default()
//! };
//! let mut engine = EvolutionEngine::new(config).unwrap();
//! let report = engine.run().unwrap();
//! println!("final fitness: {:?}", report.fitness.last());
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod evolution;
pub mod grid;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::{EvolutionConfig, RewardTable, StepOptions};
    pub use crate::engine::{EvolutionEngine, EvolutionReport};
    pub use crate::error::{ConfigError, GridError, PopulateError};
    pub use crate::evolution::{MutationTable, Population};
    pub use crate::grid::{ClearMode, GridEnvironment, Placement, StepSummary};
}
