//! Evolution - populations, breeding and mutation sampling

mod mutation;
mod population;

pub use mutation::*;
pub use population::*;
