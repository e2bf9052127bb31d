//! Agent identity, genome and running score.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::genome::{Genome, Move};

/// Opaque agent identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl AgentId {
    /// Identity for the agent at `index`. Panics if it does not fit in `u32`.
    pub fn from_index(index: usize) -> Self {
        AgentId(u32::try_from(index).expect("agent index exceeds the id range"))
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reactive agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub genome: Genome,
    /// Cumulative reward for the current evaluation run
    pub score: i64,
    /// Move chosen for the tick being resolved
    #[serde(skip)]
    pub intent: Option<Move>,
}

impl Agent {
    pub fn new(id: AgentId, genome: Genome) -> Self {
        Self {
            id,
            genome,
            score: 0,
            intent: None,
        }
    }

    /// Agent with a uniformly random genome
    pub fn random(id: AgentId, rng: &mut impl Rng) -> Self {
        Self::new(id, Genome::random(rng))
    }

    /// Is this agent holding still for the current tick
    pub fn is_staying(&self) -> bool {
        self.intent == Some(Move::Stay)
    }
}
