//! Systems - per-tick logic that runs over the grid

mod movement;
mod sensing;

pub use movement::*;
pub use sensing::*;
