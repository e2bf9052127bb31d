//! Movement system - resolves one tick of cached moves on the grid.
//!
//! Rows are resolved from the last interior row up to the first, so an agent
//! stepping forward always lands in a row that has already been handled.
//! Columns within a row are visited in a fresh random order each row so no
//! side of the grid wins contested cells systematically.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::components::{Agent, Cell, Move, Pos};
use crate::config::RewardTable;
use crate::grid::{GridEnvironment, BORDER};

/// What happened during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Successful forward or sideways moves
    pub moves: usize,
    /// Furthest row occupied after the tick, `None` if no agent was processed
    pub furthest_row: Option<usize>,
}

/// Resolve every placed agent's cached move once
pub fn movement_system(
    env: &mut GridEnvironment,
    rewards: &RewardTable,
    rng: &mut impl Rng,
) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    let GridEnvironment {
        width,
        length,
        cells,
        population,
    } = env;
    let Some(population) = population.as_mut() else {
        return outcome;
    };
    let agents = population.agents_mut();

    let mut columns: Vec<usize> = (BORDER..*width + BORDER).collect();
    for row in (BORDER..*length + BORDER).rev() {
        columns.shuffle(rng);
        // Agents present when the row's turn starts. One that slides sideways
        // into a later column is not picked up a second time.
        let occupants: Vec<(usize, usize)> = columns
            .iter()
            .filter_map(|&col| cells[row][col].agent_slot().map(|slot| (col, slot)))
            .collect();

        for (col, slot) in occupants {
            let from = Pos::new(row, col);
            let to = resolve(cells, agents, from, slot, rewards);
            if to != from {
                outcome.moves += 1;
            }
            outcome.furthest_row = outcome.furthest_row.max(Some(to.row));
        }
    }

    outcome
}

/// Apply one agent's move and reward. Returns where the agent ends up.
fn resolve(
    cells: &mut [Vec<Cell>],
    agents: &mut [Agent],
    from: Pos,
    slot: usize,
    rewards: &RewardTable,
) -> Pos {
    let intent = agents[slot].intent.unwrap_or(Move::Stay);
    if intent == Move::Stay {
        agents[slot].score += rewards.turn;
        return from;
    }
    let (d_row, d_col) = intent.offset();
    let to = from.offset(d_row, d_col);

    match cells[to.row][to.col] {
        Cell::Empty => {
            cells[to.row][to.col] = Cell::Occupied(slot);
            cells[from.row][from.col] = Cell::Empty;
            let agent = &mut agents[slot];
            if intent == Move::Forward {
                agent.score += rewards.forward;
            } else {
                agent.score += rewards.turn;
                // Done for this tick; later movers see it as standing still
                agent.intent = Some(Move::Stay);
            }
            to
        }
        Cell::Occupied(other) if agents[other].is_staying() => {
            agents[slot].score += rewards.collision;
            if intent != Move::Forward {
                agents[other].score += rewards.collision;
            }
            from
        }
        Cell::Occupied(_) | Cell::Obstacle => {
            agents[slot].score += rewards.blocked;
            from
        }
    }
}
