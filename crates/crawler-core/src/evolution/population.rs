//! Populations of agents and the generational step that breeds them.
//!
//! `generate` reads the parent scores and genomes and builds a brand new
//! population through:
//! - fitness-proportionate parent selection (with replacement)
//! - single-point crossover producing two complementary offspring
//! - per-symbol mutation sampled through a shared [`MutationTable`]

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::mutation::MutationTable;
use crate::components::{Agent, AgentId, Genome, Move, GENOME_LEN};

/// Ordered collection of agents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Population {
    agents: Vec<Agent>,
    /// Mean score as of the last `update`
    #[serde(skip)]
    fitness: Option<f64>,
}

impl Population {
    /// `n` agents with random genomes and identities `0..n`
    pub fn new(n: usize, rng: &mut impl Rng) -> Self {
        let agents = (0..n)
            .map(|i| Agent::random(AgentId::from_index(i), rng))
            .collect();
        Self::from_agents(agents)
    }

    pub fn from_agents(agents: Vec<Agent>) -> Self {
        let mut population = Self {
            agents,
            fitness: None,
        };
        population.update();
        population
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub(crate) fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Mean score at the last `update`, `None` for an empty population
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    pub fn scores(&self) -> Vec<i64> {
        self.agents.iter().map(|a| a.score).collect()
    }

    /// Highest-scoring agent (first one on ties)
    pub fn best(&self) -> Option<&Agent> {
        self.agents
            .iter()
            .reduce(|best, a| if a.score > best.score { a } else { best })
    }

    /// Zero every score before a new evaluation run
    pub fn reset(&mut self) {
        for agent in self.agents.iter_mut() {
            agent.score = 0;
            agent.intent = None;
        }
        self.update();
    }

    /// Recompute fitness from the current scores
    pub fn update(&mut self) {
        self.fitness = if self.agents.is_empty() {
            None
        } else {
            let total: i64 = self.agents.iter().map(|a| a.score).sum();
            Some(total as f64 / self.agents.len() as f64)
        };
    }

    /// Append `n` random agents, numbering them after the current highest id
    pub fn grow(&mut self, n: usize, rng: &mut impl Rng) {
        let next = self
            .agents
            .iter()
            .map(|a| a.id.0 as usize + 1)
            .max()
            .unwrap_or(0);
        for i in 0..n {
            self.agents
                .push(Agent::random(AgentId::from_index(next + i), rng));
        }
        self.update();
    }

    /// Breed the next generation.
    ///
    /// Produces `2 * pairs` offspring (`pairs` defaults to half the current
    /// size) with identities `0..2 * pairs`. The parent population is only
    /// read. `table` is switched to `mutation_rate` first if it was built
    /// for another rate.
    pub fn generate(
        &self,
        mutation_rate: f64,
        pairs: Option<usize>,
        table: &mut MutationTable,
        rng: &mut impl Rng,
    ) -> Population {
        let pairs = pairs.unwrap_or(self.agents.len() / 2);
        if pairs == 0 {
            return Population::default();
        }
        assert!(
            !self.agents.is_empty(),
            "cannot breed {pairs} pairs from an empty population"
        );
        table.ensure_rate(mutation_rate);

        let selector = WeightedIndex::new(self.selection_weights())
            .expect("shifted weights are all positive");

        let mut offspring = Vec::with_capacity(pairs * 2);
        for _ in 0..pairs {
            let left = &self.agents[selector.sample(rng)].genome;
            let right = &self.agents[selector.sample(rng)].genome;

            let cut = rng.gen_range(0..GENOME_LEN);
            let (mut first, mut second) = left.crossover(right, cut);
            mutate(&mut first, table, rng);
            mutate(&mut second, table, rng);

            for genome in [first, second] {
                let id = AgentId::from_index(offspring.len());
                offspring.push(Agent::new(id, genome));
            }
        }

        Population {
            agents: offspring,
            fitness: None,
        }
    }

    /// Scores shifted so the worst agent weighs exactly 1
    fn selection_weights(&self) -> Vec<i64> {
        let min = self.agents.iter().map(|a| a.score).min().unwrap_or(0);
        self.agents.iter().map(|a| a.score - (min - 1)).collect()
    }
}

/// Overwrite sampled positions with random moves (may repeat the old move)
fn mutate(genome: &mut Genome, table: &mut MutationTable, rng: &mut impl Rng) {
    for position in table.sample_positions(rng) {
        genome.set(position, Move::random(rng));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scored(scores: &[i64], rng: &mut StdRng) -> Population {
        let mut population = Population::new(scores.len(), rng);
        for (agent, &score) in population.agents_mut().iter_mut().zip(scores) {
            agent.score = score;
        }
        population.update();
        population
    }

    #[test]
    fn test_new_population() {
        let mut rng = StdRng::seed_from_u64(42);
        let population = Population::new(10, &mut rng);
        assert_eq!(population.len(), 10);
        let ids: Vec<u32> = population.agents().iter().map(|a| a.id.0).collect();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
        assert_eq!(population.fitness(), Some(0.0));
    }

    #[test]
    fn test_fitness_is_mean_score() {
        let mut rng = StdRng::seed_from_u64(42);
        let population = scored(&[4, -2, 7, 3], &mut rng);
        assert_eq!(population.fitness(), Some(3.0));
        assert_eq!(population.best().map(|a| a.score), Some(7));
    }

    #[test]
    fn test_empty_population_has_no_fitness() {
        let population = Population::default();
        assert_eq!(population.fitness(), None);
        assert!(population.best().is_none());
    }

    #[test]
    fn test_reset_zeroes_scores() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut population = scored(&[5, 6, 7], &mut rng);
        population.reset();
        assert!(population.scores().iter().all(|&s| s == 0));
        assert_eq!(population.fitness(), Some(0.0));
    }

    #[test]
    fn test_grow_continues_ids() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut population = Population::new(3, &mut rng);
        population.grow(2, &mut rng);
        assert_eq!(population.len(), 5);
        assert_eq!(population.agents()[3].id, AgentId(3));
        assert_eq!(population.agents()[4].id, AgentId(4));

        let mut empty = Population::default();
        empty.grow(1, &mut rng);
        assert_eq!(empty.agents()[0].id, AgentId(0));
    }

    #[test]
    fn test_grow_up_to_last_id() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut population =
            Population::from_agents(vec![Agent::random(AgentId(u32::MAX - 1), &mut rng)]);
        population.grow(1, &mut rng);
        assert_eq!(population.agents()[1].id, AgentId(u32::MAX));
    }

    #[test]
    #[should_panic(expected = "agent index exceeds the id range")]
    fn test_grow_past_id_range_panics() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut population =
            Population::from_agents(vec![Agent::random(AgentId(u32::MAX), &mut rng)]);
        population.grow(1, &mut rng);
    }

    #[test]
    fn test_generate_produces_two_per_pair() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut table = MutationTable::new(0.01);
        let parents = scored(&[1, 2, 3, 4, 5], &mut rng);

        for pairs in [1, 3, 8] {
            let children = parents.generate(0.01, Some(pairs), &mut table, &mut rng);
            assert_eq!(children.len(), 2 * pairs);
            assert_eq!(children.fitness(), None);
        }

        let default = parents.generate(0.01, None, &mut table, &mut rng);
        assert_eq!(default.len(), 4);
        let ids: Vec<u32> = default.agents().iter().map(|a| a.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_generate_leaves_parents_untouched() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut table = MutationTable::new(0.2);
        let parents = scored(&[-3, 0, 9, 2], &mut rng);
        let before = parents.clone();

        let _children = parents.generate(0.2, Some(10), &mut table, &mut rng);

        assert_eq!(parents.scores(), before.scores());
        for (a, b) in parents.agents().iter().zip(before.agents()) {
            assert_eq!(a.genome, b.genome);
        }
    }

    #[test]
    fn test_offspring_without_mutation_are_crossovers() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut table = MutationTable::new(0.0);
        let parents = Population::from_agents(vec![
            Agent::new(AgentId(0), Genome::uniform(Move::Forward)),
            Agent::new(AgentId(1), Genome::uniform(Move::Left)),
        ]);

        let children = parents.generate(0.0, Some(20), &mut table, &mut rng);
        for pair in children.agents().chunks(2) {
            let a = pair[0].genome.moves();
            let b = pair[1].genome.moves();
            if a == b {
                // Same parent drawn for both slots
                continue;
            }
            // Distinct parents: the two children are exact complements
            assert!((0..GENOME_LEN).all(|i| a[i] != b[i]));
            assert!(a.iter().all(|m| matches!(m, Move::Forward | Move::Left)));
        }
    }

    #[test]
    fn test_selection_favours_high_scores() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut table = MutationTable::new(0.0);
        let parents = Population::from_agents(vec![
            Agent {
                score: 0,
                ..Agent::new(AgentId(0), Genome::uniform(Move::Stay))
            },
            Agent {
                score: 99,
                ..Agent::new(AgentId(1), Genome::uniform(Move::Forward))
            },
        ]);

        // Weights are 1 and 100 after shifting
        let children = parents.generate(0.0, Some(200), &mut table, &mut rng);
        let forward: usize = children
            .agents()
            .iter()
            .map(|a| a.genome.count(Move::Forward))
            .sum();
        let share = forward as f64 / (children.len() * GENOME_LEN) as f64;
        assert!(share > 0.95, "forward share {share}");
    }

    #[test]
    fn test_equal_negative_scores_still_breed() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut table = MutationTable::new(0.05);
        let parents = scored(&[-10, -10, -10], &mut rng);
        let children = parents.generate(0.05, Some(2), &mut table, &mut rng);
        assert_eq!(children.len(), 4);
    }

    #[test]
    fn test_generate_switches_table_rate() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut table = MutationTable::new(0.5);
        let parents = scored(&[1, 1], &mut rng);
        parents.generate(0.0, Some(1), &mut table, &mut rng);
        assert_eq!(table.rate(), 0.0);
    }
}
