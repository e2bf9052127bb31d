//! Moves and the genome that maps every sensor pattern to one of them.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::GenomeParseError;

/// Number of genome entries: one per possible 8-bit sensor pattern.
pub const GENOME_LEN: usize = 256;

/// A single move decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Stay,
    Forward,
    Right,
    Left,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Stay, Move::Forward, Move::Right, Move::Left];

    /// One-letter symbol used in the textual genome form
    pub fn symbol(self) -> char {
        match self {
            Move::Stay => 's',
            Move::Forward => 'f',
            Move::Right => 'r',
            Move::Left => 'l',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            's' => Some(Move::Stay),
            'f' => Some(Move::Forward),
            'r' => Some(Move::Right),
            'l' => Some(Move::Left),
            _ => None,
        }
    }

    /// Uniformly random move
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// `(row, col)` displacement of the move. Forward is towards higher rows.
    pub fn offset(self) -> (isize, isize) {
        match self {
            Move::Stay => (0, 0),
            Move::Forward => (1, 0),
            Move::Right => (0, 1),
            Move::Left => (0, -1),
        }
    }
}

/// Complete reactive policy: the move to make for each sensor pattern.
///
/// Indexing with a `u8` keeps lookups inside the 0-255 domain.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Genome([Move; GENOME_LEN]);

impl Genome {
    /// Genome with the same move for every pattern
    pub fn uniform(mv: Move) -> Self {
        Self([mv; GENOME_LEN])
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        let mut moves = [Move::Stay; GENOME_LEN];
        for slot in moves.iter_mut() {
            *slot = Move::random(rng);
        }
        Self(moves)
    }

    /// Move prescribed for a sensor pattern
    pub fn lookup(&self, pattern: u8) -> Move {
        self.0[pattern as usize]
    }

    pub fn moves(&self) -> &[Move; GENOME_LEN] {
        &self.0
    }

    /// Overwrite one entry. Panics if `position >= GENOME_LEN`.
    pub fn set(&mut self, position: usize, mv: Move) {
        assert!(position < GENOME_LEN, "genome position {position} out of range");
        self.0[position] = mv;
    }

    /// Single-point crossover at `cut`.
    ///
    /// Returns `(self[..cut] ++ other[cut..], other[..cut] ++ self[cut..])`.
    pub fn crossover(&self, other: &Genome, cut: usize) -> (Genome, Genome) {
        assert!(cut <= GENOME_LEN, "cut site {cut} out of range");
        let mut first = self.clone();
        let mut second = other.clone();
        first.0[cut..].copy_from_slice(&other.0[cut..]);
        second.0[cut..].copy_from_slice(&self.0[cut..]);
        (first, second)
    }

    /// Count of entries equal to `mv`
    pub fn count(&self, mv: Move) -> usize {
        self.0.iter().filter(|&&m| m == mv).count()
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for mv in self.0.iter() {
            write!(f, "{}", mv.symbol())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Genome({self})")
    }
}

impl FromStr for Genome {
    type Err = GenomeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let len = s.chars().count();
        if len != GENOME_LEN {
            return Err(GenomeParseError::Length(len));
        }
        let mut moves = [Move::Stay; GENOME_LEN];
        for (slot, symbol) in moves.iter_mut().zip(s.chars()) {
            *slot = Move::from_symbol(symbol).ok_or(GenomeParseError::Symbol(symbol))?;
        }
        Ok(Self(moves))
    }
}

impl From<Genome> for String {
    fn from(genome: Genome) -> Self {
        genome.to_string()
    }
}

impl TryFrom<String> for Genome {
    type Error = GenomeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
