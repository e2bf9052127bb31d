//! Sensing system - reads each agent's local pattern and picks its move

use crate::components::{Cell, Pos};
use crate::grid::GridEnvironment;

/// Sampled cells as (row, col) offsets, most significant bit first.
///
/// Two cells to each side, three one row ahead and one two rows ahead.
pub const SENSOR_OFFSETS: [(isize, isize); 8] = [
    (0, -2),
    (0, -1),
    (0, 1),
    (0, 2),
    (1, -1),
    (1, 0),
    (1, 1),
    (2, 0),
];

/// Occupancy pattern around `pos`: 1 for an obstacle or any agent, 0 for empty
pub fn sensor_pattern(cells: &[Vec<Cell>], pos: Pos) -> u8 {
    SENSOR_OFFSETS.iter().fold(0u8, |bits, &(d_row, d_col)| {
        let sample = pos.offset(d_row, d_col);
        (bits << 1) | u8::from(cells[sample.row][sample.col].is_solid())
    })
}

/// Store every placed agent's move for this tick.
///
/// All patterns are read from the grid as it stands before anything moves.
pub fn sensing_system(env: &mut GridEnvironment) {
    let rows = env.interior_rows();
    let cols = env.interior_cols();
    let Some(population) = env.population.as_mut() else {
        return;
    };
    let agents = population.agents_mut();

    for row in rows {
        for col in cols.clone() {
            if let Cell::Occupied(slot) = env.cells[row][col] {
                let pattern = sensor_pattern(&env.cells, Pos::new(row, col));
                let agent = &mut agents[slot];
                agent.intent = Some(agent.genome.lookup(pattern));
            }
        }
    }
}
