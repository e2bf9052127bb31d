//! Grid cells and coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Padded-grid coordinate. Interior cells start at row 2, column 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Shift by a signed offset. Callers stay inside the padding.
    pub fn offset(self, d_row: isize, d_col: isize) -> Self {
        Self {
            row: self.row.wrapping_add_signed(d_row),
            col: self.col.wrapping_add_signed(d_col),
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Contents of one grid cell.
///
/// `Occupied` holds the agent's index in the hosted population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Obstacle,
    Occupied(usize),
}

impl Cell {
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Sensor bit: anything but an empty cell reads as 1
    pub fn is_solid(self) -> bool {
        !self.is_empty()
    }

    pub fn agent_slot(self) -> Option<usize> {
        match self {
            Cell::Occupied(slot) => Some(slot),
            Cell::Empty | Cell::Obstacle => None,
        }
    }

    pub fn kind(self) -> CellKind {
        match self {
            Cell::Empty => CellKind::Empty,
            Cell::Obstacle => CellKind::Obstacle,
            Cell::Occupied(_) => CellKind::Agent,
        }
    }
}

/// Public classification of a cell, without the internal agent slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Empty,
    Obstacle,
    Agent,
}
