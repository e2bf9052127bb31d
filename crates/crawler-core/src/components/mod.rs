//! Component definitions for the simulation.
//!
//! Components are plain data. Behavior lives in systems, the grid and the
//! evolution module.

mod agent;
mod cell;
mod genome;

pub use agent::*;
pub use cell::*;
pub use genome::*;
