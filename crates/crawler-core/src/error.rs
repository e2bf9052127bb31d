//! Error types.

use thiserror::Error;

use crate::components::{AgentId, Pos};
use crate::evolution::Population;

/// Non-fatal grid rejections
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("environment is already populated")]
    AlreadyHosted,
    #[error("not enough free cells: {requested} agents, {available} empty cells")]
    NoRoom { requested: usize, available: usize },
    #[error("cell {0} is already occupied")]
    PositionOccupied(Pos),
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),
    #[error("unknown clear mode {0:?} (expected all, agents or blocks)")]
    UnknownClearMode(String),
}

/// A rejected `populate` call. Hands the population back to the caller.
#[derive(Debug, Error)]
#[error("populate failed: {reason}")]
pub struct PopulateError {
    pub reason: GridError,
    pub population: Population,
}

impl PopulateError {
    pub fn into_population(self) -> Population {
        self.population
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenomeParseError {
    #[error("genome must have 256 symbols, got {0}")]
    Length(usize),
    #[error("invalid genome symbol {0:?} (expected one of s, f, r, l)")]
    Symbol(char),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
