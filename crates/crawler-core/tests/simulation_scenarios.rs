//! Integration tests for the grid simulation and the generational loop.
//!
//! Exercises: Population → GridEnvironment::populate → step → depopulate
//! → Population::generate
//!
//! All tests use seeded random sources and run headless.

use crawler_core::grid::BORDER;
use crawler_core::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Helpers ────────────────────────────────────────────────────────────

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn uniform(moves: &[Move]) -> Population {
    Population::from_agents(
        moves
            .iter()
            .enumerate()
            .map(|(i, &mv)| Agent::new(AgentId::from_index(i), Genome::uniform(mv)))
            .collect(),
    )
}

fn border_is_solid(env: &GridEnvironment) -> bool {
    let rows = env.length() + 2 * BORDER;
    let cols = env.width() + 2 * BORDER;
    (0..rows).all(|row| {
        (0..cols).all(|col| {
            let pos = Pos::new(row, col);
            env.is_interior(pos) || env.cell(pos) == CellKind::Obstacle
        })
    })
}

fn score_of(env: &GridEnvironment, id: u32) -> i64 {
    env.population()
        .and_then(|p| p.agent(AgentId(id)))
        .map(|a| a.score)
        .unwrap()
}

// ── Movement scenarios ─────────────────────────────────────────────────

#[test]
fn lone_forward_walker_advances_one_row() {
    let mut rng = rng();
    let mut env = GridEnvironment::new(5, 3);
    env.populate(
        uniform(&[Move::Forward]),
        Placement::Explicit(vec![Pos::new(2, 4)]),
        &mut rng,
    )
    .unwrap();

    let summary = env.step(1, &StepOptions::default(), &mut rng);

    assert_eq!(env.find(AgentId(0)), Some(Pos::new(3, 4)));
    assert_eq!(score_of(&env, 0), 1);
    assert_eq!(summary.moves, 1);
    // Row 3 is within two rows of the frontier (row 4): grid grows by its width
    assert_eq!(summary.rows_added, 5);
    assert_eq!(env.length(), 8);
    assert!(border_is_solid(&env));
}

#[test]
fn stacked_walkers_never_share_a_cell() {
    let mut rng = rng();
    let mut env = GridEnvironment::new(5, 20);
    env.populate(
        uniform(&[Move::Forward, Move::Forward]),
        Placement::Explicit(vec![Pos::new(2, 3), Pos::new(3, 3)]),
        &mut rng,
    )
    .unwrap();

    for tick in 1..=5 {
        env.step(1, &StepOptions::default(), &mut rng);
        assert_eq!(env.agent_count(), 2);
        assert_eq!(env.find(AgentId(1)), Some(Pos::new(3 + tick, 3)));
        assert_eq!(env.find(AgentId(0)), Some(Pos::new(2 + tick, 3)));
    }
    assert_eq!(score_of(&env, 0), 5);
    assert_eq!(score_of(&env, 1), 5);
}

#[test]
fn turning_into_the_wall_costs_blocked_penalty() {
    let mut rng = rng();
    let mut env = GridEnvironment::new(5, 5);
    let edge = Pos::new(4, env.width() + BORDER - 1);
    env.populate(
        uniform(&[Move::Right]),
        Placement::Explicit(vec![edge]),
        &mut rng,
    )
    .unwrap();

    env.step(1, &StepOptions::default(), &mut rng);

    assert_eq!(env.find(AgentId(0)), Some(edge));
    assert_eq!(score_of(&env, 0), -10);
}

#[test]
fn custom_rewards_are_applied() {
    let mut rng = rng();
    let mut env = GridEnvironment::new(5, 30);
    env.populate(
        uniform(&[Move::Forward, Move::Right]),
        Placement::Explicit(vec![Pos::new(2, 2), Pos::new(2, 6)]),
        &mut rng,
    )
    .unwrap();
    let options = StepOptions {
        rewards: RewardTable {
            forward: 4,
            blocked: -1,
            ..Default::default()
        },
        ..Default::default()
    };

    env.step(3, &options, &mut rng);

    assert_eq!(score_of(&env, 0), 12);
    assert_eq!(score_of(&env, 1), -3);
}

// ── Grid maintenance ───────────────────────────────────────────────────

#[test]
fn border_survives_growth_and_obstacles() {
    let mut rng = rng();
    let mut env = GridEnvironment::new(7, 4);
    assert!(border_is_solid(&env));

    for _ in 0..5 {
        let rows = rng.gen_range(1..6);
        env.extend_with_obstacles(rows, 0.3, &mut rng);
        assert!(border_is_solid(&env));
    }
    env.clear(ClearMode::All);
    assert!(border_is_solid(&env));
    assert_eq!(env.obstacle_count(), 0);
}

#[test]
fn auto_extend_adds_obstacles_when_blocking() {
    let mut rng = rng();
    let mut env = GridEnvironment::new(10, 3);
    env.populate(
        uniform(&[Move::Stay]),
        Placement::Explicit(vec![Pos::new(3, 5)]),
        &mut rng,
    )
    .unwrap();
    let options = StepOptions {
        blocking: true,
        density: 0.1,
        ..Default::default()
    };

    env.step(1, &options, &mut rng);

    assert_eq!(env.length(), 13);
    assert_eq!(env.obstacle_count(), 10);
}

#[test]
fn empty_grid_steps_without_extending() {
    let mut rng = rng();
    let mut env = GridEnvironment::new(4, 2);
    let summary = env.step(10, &StepOptions::default(), &mut rng);

    assert_eq!(summary.ticks, 10);
    assert_eq!(summary.furthest_row, None);
    assert_eq!(env.length(), 2);
}

#[test]
fn sensor_index_stays_in_range_under_random_worlds() {
    let mut rng = rng();
    for _ in 0..20 {
        let mut env = GridEnvironment::new(8, 8);
        env.block(rng.gen_range(0.0..0.6), 0..8, &mut rng);
        env.populate(
            Population::new(10, &mut rng),
            Placement::Scatter { rows: Some(8) },
            &mut rng,
        )
        .unwrap();

        let mut seen_nonzero = false;
        for row in env.interior_rows() {
            for col in env.interior_cols() {
                let pattern = env.neighborhood(Pos::new(row, col));
                seen_nonzero |= pattern != 0;
            }
        }
        assert!(seen_nonzero);
    }
}

// ── Evolution ──────────────────────────────────────────────────────────

#[test]
fn fitness_is_mean_after_step() {
    let mut rng = rng();
    let mut env = GridEnvironment::new(12, 30);
    env.populate(Population::new(20, &mut rng), Placement::default(), &mut rng)
        .unwrap();

    env.step(25, &StepOptions::default(), &mut rng);

    let population = env.depopulate().unwrap();
    let scores = population.scores();
    let mean = scores.iter().sum::<i64>() as f64 / scores.len() as f64;
    assert_eq!(population.fitness(), Some(mean));
}

#[test]
fn generate_returns_two_offspring_per_pair() {
    let mut rng = rng();
    let mut table = MutationTable::new(0.05);
    let parents = Population::new(9, &mut rng);

    for pairs in [1, 4, 13] {
        let children = parents.generate(0.05, Some(pairs), &mut table, &mut rng);
        assert_eq!(children.len(), 2 * pairs);
    }
}

#[test]
fn mutation_share_matches_rate() {
    let mut rng = rng();
    let rate = 0.08;
    let mut table = MutationTable::new(rate);
    let parents = uniform(&[Move::Forward, Move::Forward]);

    let children = parents.generate(rate, Some(500), &mut table, &mut rng);
    let changed: usize = children
        .agents()
        .iter()
        .map(|a| GENOME_LEN - a.genome.count(Move::Forward))
        .sum();

    // A mutated entry keeps its old move one time in four
    let expected = children.len() as f64 * GENOME_LEN as f64 * rate * 0.75;
    let relative = (changed as f64 - expected).abs() / expected;
    assert!(relative < 0.05, "changed {changed}, expected {expected}");
}

#[test]
fn generations_improve_forward_progress() {
    let config = EvolutionConfig {
        width: 20,
        length: 20,
        population_size: 40,
        generations: 15,
        ticks_per_generation: 30,
        mutation_rate: 0.01,
        seed: 7,
        ..Default::default()
    };
    let mut engine = EvolutionEngine::new(config).unwrap();
    let report = engine.run().unwrap();

    assert_eq!(report.fitness.len(), 15);
    let first = report.fitness[0];
    let best_late = report.fitness[10..]
        .iter()
        .cloned()
        .fold(f64::MIN, f64::max);
    assert!(
        best_late > first,
        "no improvement: first {first}, late best {best_late}"
    );
}

#[test]
fn report_serializes_genomes_as_text() {
    let config = EvolutionConfig {
        width: 8,
        length: 8,
        population_size: 4,
        generations: 1,
        ticks_per_generation: 5,
        ..Default::default()
    };
    let mut engine = EvolutionEngine::new(config).unwrap();
    let report = engine.run().unwrap();

    let json = serde_json::to_value(&report).unwrap();
    let genome = json["population"]["agents"][0]["genome"].as_str().unwrap();
    assert_eq!(genome.len(), GENOME_LEN);
    assert!(genome.chars().all(|c| "sfrl".contains(c)));
}
