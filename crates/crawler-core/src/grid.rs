//! The padded cell grid agents walk across.
//!
//! The interior is `width` columns by `length` rows and is wrapped in a
//! two-cell obstacle border on every side, so the sensor pattern of any
//! interior cell can be read without bounds checks. Coordinates are in padded
//! space: interior rows are `2..length + 2`, interior columns `2..width + 2`.
//! "Forward" is towards higher row numbers, and the grid grows in that
//! direction as agents approach its last row.

use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use rand::seq::index;
use rand::Rng;

use crate::components::{Agent, AgentId, Cell, CellKind, Move, Pos};
use crate::config::StepOptions;
use crate::error::{GridError, PopulateError};
use crate::evolution::Population;
use crate::systems::{movement_system, sensing_system, sensor_pattern};

/// Thickness of the obstacle border
pub const BORDER: usize = 2;

/// Minimum number of top rows used when scattering a population
const MIN_SPAWN_ROWS: usize = 5;

/// Auto-extension triggers when an agent gets this close to the last row
const EXTEND_MARGIN: usize = 2;

/// Where `populate` puts agents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Random distinct empty cells in the top `rows` interior rows.
    /// `None` sizes the band from the population and grid width.
    Scatter { rows: Option<usize> },
    /// One cell per agent, in population order
    Explicit(Vec<Pos>),
}

impl Default for Placement {
    fn default() -> Self {
        Placement::Scatter { rows: None }
    }
}

/// What `clear` removes from the interior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearMode {
    All,
    Agents,
    Blocks,
}

impl FromStr for ClearMode {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ClearMode::All),
            "ag" | "agent" | "agents" => Ok(ClearMode::Agents),
            "b" | "block" | "blocks" => Ok(ClearMode::Blocks),
            other => {
                log::warn!("unknown clear mode {:?}", other);
                Err(GridError::UnknownClearMode(other.to_string()))
            }
        }
    }
}

/// Totals over one `step` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepSummary {
    pub ticks: usize,
    /// Successful forward or sideways moves
    pub moves: usize,
    /// Interior rows appended by auto-extension
    pub rows_added: usize,
    /// Furthest row any agent occupied, `None` if no agent was placed
    pub furthest_row: Option<usize>,
}

/// Grid world hosting at most one population
#[derive(Debug, Clone)]
pub struct GridEnvironment {
    pub(crate) width: usize,
    pub(crate) length: usize,
    pub(crate) cells: Vec<Vec<Cell>>,
    pub(crate) population: Option<Population>,
}

impl GridEnvironment {
    /// Empty grid with `width` columns and `length` rows inside the border.
    ///
    /// Panics if either dimension is zero.
    pub fn new(width: usize, length: usize) -> Self {
        assert!(
            width > 0 && length > 0,
            "grid must be non-empty, got {width}x{length}"
        );
        let mut env = Self {
            width,
            length: 0,
            cells: vec![vec![Cell::Obstacle; width + 2 * BORDER]; 2 * BORDER],
            population: None,
        };
        env.extend(length);
        env
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Padded row indices of the interior
    pub fn interior_rows(&self) -> Range<usize> {
        BORDER..self.length + BORDER
    }

    /// Padded column indices of the interior
    pub fn interior_cols(&self) -> Range<usize> {
        BORDER..self.width + BORDER
    }

    /// Last interior row
    pub fn frontier_row(&self) -> usize {
        self.length + BORDER - 1
    }

    pub fn is_interior(&self, pos: Pos) -> bool {
        self.interior_rows().contains(&pos.row) && self.interior_cols().contains(&pos.col)
    }

    /// Classify any cell, border included. Panics outside the padded grid.
    pub fn cell(&self, pos: Pos) -> CellKind {
        self.cells[pos.row][pos.col].kind()
    }

    /// Agent standing on `pos`, if any
    pub fn agent_at(&self, pos: Pos) -> Option<&Agent> {
        let slot = self.cells[pos.row][pos.col].agent_slot()?;
        self.population.as_ref().map(|p| &p.agents()[slot])
    }

    pub fn population(&self) -> Option<&Population> {
        self.population.as_ref()
    }

    pub fn is_populated(&self) -> bool {
        self.population.is_some()
    }

    /// Obstacles inside the border
    pub fn obstacle_count(&self) -> usize {
        self.count_interior(|cell| cell == Cell::Obstacle)
    }

    /// Agents currently standing on the grid
    pub fn agent_count(&self) -> usize {
        self.count_interior(|cell| matches!(cell, Cell::Occupied(_)))
    }

    /// Host `population`, placing every agent on its own cell.
    ///
    /// On rejection nothing is placed and the population is handed back in
    /// the error.
    pub fn populate(
        &mut self,
        population: Population,
        placement: Placement,
        rng: &mut impl Rng,
    ) -> Result<(), PopulateError> {
        if self.population.is_some() {
            log::warn!("environment is already populated");
            return Err(PopulateError {
                reason: GridError::AlreadyHosted,
                population,
            });
        }

        let positions = match self.placement_positions(population.len(), placement, rng) {
            Ok(positions) => positions,
            Err(reason) => {
                log::warn!("could not place population: {}", reason);
                return Err(PopulateError { reason, population });
            }
        };

        for (slot, pos) in positions.into_iter().enumerate() {
            self.cells[pos.row][pos.col] = Cell::Occupied(slot);
        }
        log::debug!("placed {} agents", population.len());
        self.population = Some(population);
        Ok(())
    }

    /// Take the hosted population off the grid. Scores are left as they are.
    pub fn depopulate(&mut self) -> Option<Population> {
        self.clear(ClearMode::Agents);
        self.population.take()
    }

    /// Turn a random share of empty cells in interior rows `rows` into
    /// obstacles.
    ///
    /// Aims for `floor(density * width * rows.len())` obstacles, drawn only
    /// from empty cells, and returns how many were added.
    pub fn block(&mut self, density: f64, rows: Range<usize>, rng: &mut impl Rng) -> usize {
        assert!(
            (0.0..=1.0).contains(&density),
            "obstacle density {density} outside [0, 1]"
        );
        let rows = rows.start..rows.end.min(self.length);
        if rows.is_empty() {
            return 0;
        }

        let target = (density * (self.width * rows.len()) as f64) as usize;
        let padded = rows.start + BORDER..rows.end + BORDER;
        let candidates = self.empty_cells(padded);
        let count = target.min(candidates.len());
        if count < target {
            log::debug!("only {} of {} obstacles fit", count, target);
        }

        for i in index::sample(rng, candidates.len(), count) {
            let pos = candidates[i];
            self.cells[pos.row][pos.col] = Cell::Obstacle;
        }
        count
    }

    /// Put obstacles on the given interior cells.
    ///
    /// Only empty cells change: agents and existing obstacles are left alone.
    /// Returns how many obstacles were added.
    pub fn block_at(&mut self, positions: &[Pos]) -> usize {
        let mut added = 0;
        for &pos in positions {
            self.assert_interior(pos);
            let cell = &mut self.cells[pos.row][pos.col];
            if cell.is_empty() {
                *cell = Cell::Obstacle;
                added += 1;
            }
        }
        added
    }

    /// Empty interior cells matching `mode`. The border is never touched.
    pub fn clear(&mut self, mode: ClearMode) {
        let rows = self.interior_rows();
        let cols = self.interior_cols();
        for row in &mut self.cells[rows] {
            for cell in &mut row[cols.clone()] {
                let remove = match (mode, *cell) {
                    (ClearMode::All, _) => true,
                    (ClearMode::Agents, Cell::Occupied(_)) => true,
                    (ClearMode::Blocks, Cell::Obstacle) => true,
                    _ => false,
                };
                if remove {
                    *cell = Cell::Empty;
                }
            }
        }
    }

    /// Append `rows` empty interior rows, keeping the bottom border closed
    pub fn extend(&mut self, rows: usize) {
        let padded_width = self.width + 2 * BORDER;
        self.cells.truncate(self.cells.len() - BORDER);

        let mut open_row = vec![Cell::Empty; padded_width];
        open_row[..BORDER].fill(Cell::Obstacle);
        open_row[padded_width - BORDER..].fill(Cell::Obstacle);
        self.cells.extend(std::iter::repeat(open_row).take(rows));
        self.cells.extend(
            std::iter::repeat(vec![Cell::Obstacle; padded_width]).take(BORDER),
        );

        self.length += rows;
    }

    /// `extend`, then scatter obstacles over the new rows
    pub fn extend_with_obstacles(&mut self, rows: usize, density: f64, rng: &mut impl Rng) {
        let start = self.length;
        self.extend(rows);
        self.block(density, start..self.length, rng);
    }

    /// Locate an agent by identity
    pub fn find(&self, id: AgentId) -> Option<Pos> {
        let population = self.population.as_ref()?;
        let found = self.interior_rows().find_map(|row| {
            self.interior_cols().find_map(|col| match self.cells[row][col] {
                Cell::Occupied(slot) if population.agents()[slot].id == id => {
                    Some(Pos::new(row, col))
                }
                _ => None,
            })
        });
        if found.is_none() {
            log::debug!("agent {} not found", id);
        }
        found
    }

    /// Take agents off the grid without removing them from the population.
    ///
    /// Stops at the first identity that is not on the grid; agents listed
    /// before it have already been removed.
    pub fn remove(&mut self, ids: &[AgentId]) -> Result<(), GridError> {
        for &id in ids {
            let pos = self.find(id).ok_or(GridError::AgentNotFound(id))?;
            self.cells[pos.row][pos.col] = Cell::Empty;
        }
        Ok(())
    }

    /// 8-bit sensor pattern seen from an interior cell
    pub fn neighborhood(&self, pos: Pos) -> u8 {
        self.assert_interior(pos);
        sensor_pattern(&self.cells, pos)
    }

    /// Sensor pattern around an agent, `None` if it is not on the grid
    pub fn neighborhood_of(&self, id: AgentId) -> Option<u8> {
        self.find(id).map(|pos| self.neighborhood(pos))
    }

    /// Move the genome of the agent on `pos` prescribes right now
    pub fn intended_move(&self, pos: Pos) -> Option<Move> {
        let agent = self.agent_at(pos)?;
        Some(agent.genome.lookup(self.neighborhood(pos)))
    }

    /// Cache every placed agent's move for the coming tick
    pub fn set_moves(&mut self) {
        sensing_system(self);
    }

    /// Run `ticks` simulation ticks, then refresh the population's fitness
    pub fn step(
        &mut self,
        ticks: usize,
        options: &StepOptions,
        rng: &mut impl Rng,
    ) -> StepSummary {
        let mut summary = StepSummary::default();

        for _ in 0..ticks {
            sensing_system(self);
            let outcome = movement_system(self, &options.rewards, rng);
            summary.ticks += 1;
            summary.moves += outcome.moves;

            // No agent on the grid: nothing can reach the frontier
            let Some(furthest) = outcome.furthest_row else {
                continue;
            };
            summary.furthest_row = summary.furthest_row.max(Some(furthest));

            if options.auto_extend && self.frontier_row() - furthest <= EXTEND_MARGIN {
                let rows = self.width;
                if options.blocking {
                    self.extend_with_obstacles(rows, options.density, rng);
                } else {
                    self.extend(rows);
                }
                summary.rows_added += rows;
                log::debug!(
                    "agent reached row {}, grid extended to {} rows",
                    furthest,
                    self.length
                );
            }
        }

        if let Some(population) = self.population.as_mut() {
            population.update();
        }
        summary
    }

    /// Text view marking the listed agents with `@` and every other agent
    /// with `-`
    pub fn render_highlighted(&self, ids: &[AgentId]) -> String {
        self.render(|agent| if ids.contains(&agent.id) { '@' } else { '-' })
    }

    fn render(&self, agent_glyph: impl Fn(&Agent) -> char) -> String {
        let lines: Vec<String> = self
            .cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&cell| match cell {
                        Cell::Empty => ' ',
                        Cell::Obstacle => 'X',
                        Cell::Occupied(slot) => self
                            .population
                            .as_ref()
                            .map(|p| agent_glyph(&p.agents()[slot]))
                            .unwrap_or('?'),
                    })
                    .collect()
            })
            .collect();
        lines.join("\n")
    }

    fn placement_positions(
        &self,
        count: usize,
        placement: Placement,
        rng: &mut impl Rng,
    ) -> Result<Vec<Pos>, GridError> {
        match placement {
            Placement::Scatter { rows } => {
                let rows = rows
                    .unwrap_or_else(|| default_spawn_rows(count, self.width))
                    .min(self.length);
                let candidates = self.empty_cells(BORDER..rows + BORDER);
                if candidates.len() < count {
                    return Err(GridError::NoRoom {
                        requested: count,
                        available: candidates.len(),
                    });
                }
                Ok(index::sample(rng, candidates.len(), count)
                    .into_iter()
                    .map(|i| candidates[i])
                    .collect())
            }
            Placement::Explicit(positions) => {
                assert_eq!(
                    positions.len(),
                    count,
                    "explicit placement needs one position per agent"
                );
                let mut taken = HashSet::with_capacity(count);
                for &pos in &positions {
                    self.assert_interior(pos);
                    if !self.cells[pos.row][pos.col].is_empty() || !taken.insert(pos) {
                        return Err(GridError::PositionOccupied(pos));
                    }
                }
                Ok(positions)
            }
        }
    }

    /// Empty interior cells in the padded rows `rows`, row-major
    fn empty_cells(&self, rows: Range<usize>) -> Vec<Pos> {
        rows.flat_map(|row| self.interior_cols().map(move |col| Pos::new(row, col)))
            .filter(|pos| self.cells[pos.row][pos.col].is_empty())
            .collect()
    }

    fn count_interior(&self, pred: impl Fn(Cell) -> bool) -> usize {
        self.cells[self.interior_rows()]
            .iter()
            .flat_map(|row| row[self.interior_cols()].iter())
            .filter(|&&cell| pred(cell))
            .count()
    }

    fn assert_interior(&self, pos: Pos) {
        assert!(
            self.is_interior(pos),
            "{pos} is outside the {}x{} interior",
            self.width,
            self.length
        );
    }
}

impl Default for GridEnvironment {
    fn default() -> Self {
        Self::new(30, 30)
    }
}

impl fmt::Display for GridEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(|_| 'O'))
    }
}

/// Spawn band that leaves about half the cells free
fn default_spawn_rows(count: usize, width: usize) -> usize {
    (2 * count).div_ceil(width).max(MIN_SPAWN_ROWS)
}
