//! Mutation sampling through a cached binomial probability table.
//!
//! Mutating each of the 256 genome entries with probability `mr` is the same
//! as drawing the number of mutated entries from Binomial(256, mr) and then
//! picking that many distinct positions. The table holds the probability mass
//! for each count and is grown only as far as draws actually reach, so one
//! table serves a whole run.

use rand::seq::index;
use rand::Rng;

use crate::components::GENOME_LEN;

/// Probability-mass table for the number of mutated genome positions
#[derive(Debug, Clone)]
pub struct MutationTable {
    rate: f64,
    pmf: Vec<f64>,
    /// Natural log of the last entry in `pmf`. Entries are built in log
    /// space because `(1 - rate)^256` underflows to zero at high rates.
    last_ln: f64,
}

impl MutationTable {
    /// Panics unless `0.0 <= rate <= 1.0`.
    pub fn new(rate: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&rate),
            "mutation rate {rate} outside [0, 1]"
        );
        Self {
            rate,
            pmf: Vec::new(),
            last_ln: f64::NEG_INFINITY,
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Entries computed so far
    pub fn len(&self) -> usize {
        self.pmf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pmf.is_empty()
    }

    /// Drop the cached entries and switch to `rate`
    pub fn reset(&mut self, rate: f64) {
        *self = Self::new(rate);
    }

    /// Reset only when `rate` differs from the table's rate
    pub fn ensure_rate(&mut self, rate: f64) {
        if rate != self.rate {
            log::debug!(
                "mutation rate changed from {} to {}, rebuilding table",
                self.rate,
                rate
            );
            self.reset(rate);
        }
    }

    /// Probability of exactly `k` mutations, extending the table as needed
    pub fn probability(&mut self, k: usize) -> f64 {
        assert!(k <= GENOME_LEN, "mutation count {k} out of range");
        self.fill_to(k);
        self.pmf[k]
    }

    /// Draw how many positions to mutate
    pub fn sample_count(&mut self, rng: &mut impl Rng) -> usize {
        if self.rate >= 1.0 {
            return GENOME_LEN;
        }
        let mut remaining: f64 = rng.gen();
        for k in 0..=GENOME_LEN {
            self.fill_to(k);
            remaining -= self.pmf[k];
            if remaining <= 0.0 {
                return k;
            }
        }
        // Rounding left a sliver of mass unaccounted for
        GENOME_LEN
    }

    /// Draw the distinct genome positions to mutate
    pub fn sample_positions(&mut self, rng: &mut impl Rng) -> Vec<usize> {
        let count = self.sample_count(rng);
        index::sample(rng, GENOME_LEN, count).into_vec()
    }

    fn fill_to(&mut self, k: usize) {
        if self.rate >= 1.0 {
            while self.pmf.len() <= k {
                let mass = if self.pmf.len() == GENOME_LEN { 1.0 } else { 0.0 };
                self.pmf.push(mass);
            }
            return;
        }

        // ln p(k+1) = ln p(k) + ln(rate / (1 - rate)) + ln((256 - k) / (k + 1))
        let ln_odds = self.rate.ln() - (1.0 - self.rate).ln();
        if self.pmf.is_empty() {
            self.last_ln = GENOME_LEN as f64 * (1.0 - self.rate).ln();
            self.pmf.push(self.last_ln.exp());
        }
        while self.pmf.len() <= k {
            let prev_k = self.pmf.len() - 1;
            self.last_ln += ln_odds + ((GENOME_LEN - prev_k) as f64).ln()
                - ((prev_k + 1) as f64).ln();
            self.pmf.push(self.last_ln.exp());
        }
    }
}
