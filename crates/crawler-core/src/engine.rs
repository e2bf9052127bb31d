//! Evolution engine - main entry point for running an evolution

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::components::Agent;
use crate::config::EvolutionConfig;
use crate::error::{ConfigError, GridError};
use crate::evolution::{MutationTable, Population};
use crate::grid::{GridEnvironment, Placement};

/// Result of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionReport {
    /// Mean score of each evaluated generation, in order
    pub fitness: Vec<f64>,
    /// Best agent of the last evaluated generation, with its score
    pub champion: Option<Agent>,
    /// Offspring of the last generation, not yet evaluated
    pub population: Population,
}

/// Drives generations: place, simulate, score, breed
pub struct EvolutionEngine {
    config: EvolutionConfig,
    /// Single random source for the whole run
    rng: StdRng,
    population: Population,
    /// Shared by every `generate` call of the run
    mutation_table: MutationTable,
    fitness_history: Vec<f64>,
    champion: Option<Agent>,
}

impl EvolutionEngine {
    /// Validate `config` and create a random initial population
    pub fn new(config: EvolutionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let population = Population::new(config.population_size, &mut rng);
        Ok(Self::build(config, rng, population))
    }

    /// Start from a given population instead of a random one
    pub fn with_population(
        config: EvolutionConfig,
        population: Population,
    ) -> Result<Self, ConfigError> {
        let config = EvolutionConfig {
            population_size: population.len(),
            ..config
        };
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self::build(config, rng, population))
    }

    fn build(config: EvolutionConfig, rng: StdRng, population: Population) -> Self {
        let mutation_table = MutationTable::new(config.mutation_rate);
        Self {
            config,
            rng,
            population,
            mutation_table,
            fitness_history: Vec::new(),
            champion: None,
        }
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Population waiting for its evaluation
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Generations evaluated so far
    pub fn generation(&self) -> usize {
        self.fitness_history.len()
    }

    pub fn fitness_history(&self) -> &[f64] {
        &self.fitness_history
    }

    pub fn mutation_table(&self) -> &MutationTable {
        &self.mutation_table
    }

    /// Best agent of the last evaluated generation
    pub fn champion(&self) -> Option<&Agent> {
        self.champion.as_ref()
    }

    /// Evaluate the current population on a fresh grid and replace it with
    /// its offspring. Returns the generation's fitness.
    pub fn run_generation(&mut self) -> Result<f64, GridError> {
        let scored = self.evaluate()?;
        let fitness = scored.fitness().unwrap_or(0.0);

        self.fitness_history.push(fitness);
        self.champion = scored.best().cloned();
        self.population = scored.generate(
            self.config.mutation_rate,
            None,
            &mut self.mutation_table,
            &mut self.rng,
        );
        Ok(fitness)
    }

    /// Run the remaining configured generations
    pub fn run(&mut self) -> Result<EvolutionReport, GridError> {
        while self.generation() < self.config.generations {
            self.run_generation()?;
        }
        Ok(self.report())
    }

    pub fn report(&self) -> EvolutionReport {
        EvolutionReport {
            fitness: self.fitness_history.clone(),
            champion: self.champion.clone(),
            population: self.population.clone(),
        }
    }

    /// Place, simulate and take back the current population
    fn evaluate(&mut self) -> Result<Population, GridError> {
        let config = &self.config;
        let mut env = GridEnvironment::new(config.width, config.length);

        let mut population = std::mem::take(&mut self.population);
        population.reset();
        let placement = Placement::Scatter {
            rows: config.spawn_rows,
        };
        if let Err(err) = env.populate(population, placement, &mut self.rng) {
            self.population = err.population;
            return Err(err.reason);
        }

        // Obstacles go down after the agents so they never take a spawn cell
        if config.blocking {
            env.block(
                config.density,
                config.obstacle_start_row..config.length,
                &mut self.rng,
            );
        }

        let summary = env.step(
            config.ticks_per_generation,
            &config.step_options(),
            &mut self.rng,
        );
        let scored = env
            .depopulate()
            .expect("population is hosted until depopulated");

        log::info!(
            "generation {}: fitness {:.3}, best {}, furthest row {}, grid {} rows",
            self.fitness_history.len(),
            scored.fitness().unwrap_or(0.0),
            scored.best().map(|a| a.score).unwrap_or(0),
            summary.furthest_row.unwrap_or(0),
            env.length(),
        );
        Ok(scored)
    }
}
