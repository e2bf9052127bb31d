//! Run configuration: rewards, per-step options and the evolution settings.
//!
//! Every field has a default so partial JSON files and CLI overrides can be
//! layered on top of [`EvolutionConfig::default`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Score deltas applied while resolving a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTable {
    /// Successful move one row forward
    pub forward: i64,
    /// Successful sideways move, also applied for staying put
    pub turn: i64,
    /// Running into an agent that is staying put
    pub collision: i64,
    /// Running into an obstacle or a moving agent
    pub blocked: i64,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            forward: 1,
            turn: 0,
            collision: -5,
            blocked: -10,
        }
    }
}

/// Options for [`GridEnvironment::step`](crate::grid::GridEnvironment::step)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepOptions {
    /// Grow the grid when agents come near its last row
    pub auto_extend: bool,
    /// Scatter obstacles into rows added by auto-extension
    pub blocking: bool,
    /// Obstacle density for those rows
    pub density: f64,
    pub rewards: RewardTable,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self {
            auto_extend: true,
            blocking: false,
            density: 0.05,
            rewards: RewardTable::default(),
        }
    }
}

/// Parameters for a full evolution run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Interior grid width in cells
    pub width: usize,
    /// Initial interior grid length in rows
    pub length: usize,
    pub population_size: usize,
    pub generations: usize,
    pub ticks_per_generation: usize,
    /// Per-symbol mutation probability
    pub mutation_rate: f64,
    /// Top rows agents are scattered over, `None` to size it from the population
    pub spawn_rows: Option<usize>,
    /// Scatter obstacles over the initial grid and into auto-extended rows
    pub blocking: bool,
    pub density: f64,
    /// First interior row that receives obstacles in the initial grid
    pub obstacle_start_row: usize,
    pub auto_extend: bool,
    pub rewards: RewardTable,
    pub seed: u64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            width: 30,
            length: 30,
            population_size: 50,
            generations: 20,
            ticks_per_generation: 100,
            mutation_rate: 0.01,
            spawn_rows: None,
            blocking: false,
            density: 0.05,
            obstacle_start_row: 10,
            auto_extend: true,
            rewards: RewardTable::default(),
            seed: 42,
        }
    }
}

impl EvolutionConfig {
    /// Parse a (possibly partial) JSON configuration
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn step_options(&self) -> StepOptions {
        StepOptions {
            auto_extend: self.auto_extend,
            blocking: self.blocking,
            density: self.density,
            rewards: self.rewards,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.width == 0 || self.length == 0 {
            return invalid(format!(
                "grid must be non-empty, got {}x{}",
                self.width, self.length
            ));
        }
        if self.population_size < 2 {
            return invalid(format!(
                "population_size must be at least 2, got {}",
                self.population_size
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return invalid(format!(
                "mutation_rate must be within [0, 1], got {}",
                self.mutation_rate
            ));
        }
        if !(0.0..=1.0).contains(&self.density) {
            return invalid(format!(
                "density must be within [0, 1], got {}",
                self.density
            ));
        }
        if let Some(rows) = self.spawn_rows {
            if rows == 0 || rows > self.length {
                return invalid(format!(
                    "spawn_rows must be within 1..={}, got {}",
                    self.length, rows
                ));
            }
        }
        let spawn_cells = self.width * self.spawn_rows.unwrap_or(self.length);
        if self.population_size > spawn_cells {
            return invalid(format!(
                "{} agents do not fit in {} spawn cells",
                self.population_size, spawn_cells
            ));
        }
        Ok(())
    }
}
