//! Sampling without replacement over an ANV distribution.
//!
//! Each draw removes the winner's weight from a cloned cumulative index and
//! chains the seed through `next_seed(prev, winner)`, so the full ordered
//! winner sequence is a pure function of (snapshot, initial seed).

use vine_core::hashing::{draw_value, next_seed};
use vine_core::types::{AddressAnv, Hash256};

use crate::distribution::AnvDistribution;

/// Draws ordered, distinct lottery winners from a per-height snapshot.
pub struct WalletSelector {
    distribution: AnvDistribution,
}

impl WalletSelector {
    pub fn new(snapshot: impl IntoIterator<Item = AddressAnv>) -> Self {
        Self {
            distribution: AnvDistribution::new(snapshot),
        }
    }

    pub fn from_distribution(distribution: AnvDistribution) -> Self {
        Self { distribution }
    }

    /// Draw up to `n` distinct winners, ordered by draw.
    ///
    /// Exhausting the distribution before reaching `n` is not an error;
    /// the result then holds every weighted address exactly once. An empty
    /// distribution yields an empty result.
    pub fn select(&self, seed: &Hash256, n: usize) -> Vec<AddressAnv> {
        let entries = self.distribution.entries();
        let mut index = self.distribution.index().clone();
        let mut remaining = self.distribution.total_weight();
        let mut seed = *seed;
        let mut winners = Vec::with_capacity(n.min(entries.len()));

        while winners.len() < n && remaining > 0 {
            let draw = draw_value(&seed, remaining);
            let i = index.find(draw);
            let winner = entries[i].clone();

            index.sub(i, winner.anv as u128);
            remaining -= winner.anv as u128;
            seed = next_seed(&seed, &winner.address);
            winners.push(winner);
        }
        winners
    }

    /// Number of weighted addresses available to draw from.
    pub fn size(&self) -> usize {
        self.distribution.size()
    }

    pub fn distribution(&self) -> &AnvDistribution {
        &self.distribution
    }
}
