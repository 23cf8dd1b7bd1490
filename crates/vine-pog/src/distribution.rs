//! Cumulative ANV weight distribution for the ambassador lottery.
//!
//! An [`AnvDistribution`] is an immutable per-height snapshot: entries are
//! deduplicated by address (last write wins), zero weights are dropped, and
//! the rest are ordered by raw address bytes so every node indexes the same
//! entry list. The cumulative index is a binary-indexed tree, which gives
//! O(log k) draws and lets the selector subtract a winner's weight without
//! rebuilding.
//!
//! All weight arithmetic is u128 over u64 inputs; the draw path never
//! touches floating point.

use std::collections::{BTreeMap, HashMap};

use vine_core::error::SelectionError;
use vine_core::hashing::draw_value;
use vine_core::types::{Address, AddressAnv, Hash256};

/// Binary-indexed tree over u128 weights, 1-based internally.
#[derive(Clone)]
pub(crate) struct WeightIndex {
    tree: Vec<u128>,
    len: usize,
}

impl WeightIndex {
    fn from_weights(weights: &[u64]) -> Self {
        let len = weights.len();
        let mut tree = vec![0u128; len + 1];
        for i in 1..=len {
            tree[i] += weights[i - 1] as u128;
            let parent = i + (i & i.wrapping_neg());
            if parent <= len {
                let v = tree[i];
                tree[parent] += v;
            }
        }
        Self { tree, len }
    }

    /// Sum of the first `count` weights.
    fn prefix(&self, mut count: usize) -> u128 {
        let mut sum = 0u128;
        while count > 0 {
            sum += self.tree[count];
            count -= count & count.wrapping_neg();
        }
        sum
    }

    pub(crate) fn total(&self) -> u128 {
        self.prefix(self.len)
    }

    /// Subtract `amount` from the weight at 0-based `index`.
    pub(crate) fn sub(&mut self, index: usize, amount: u128) {
        let mut i = index + 1;
        while i <= self.len {
            self.tree[i] -= amount;
            i += i & i.wrapping_neg();
        }
    }

    /// 0-based index of the first entry whose cumulative weight exceeds
    /// `target`. Requires `target < total()`.
    pub(crate) fn find(&self, mut target: u128) -> usize {
        let mut pos = 0usize;
        let mut step = self.len.next_power_of_two();
        while step > 0 {
            let next = pos + step;
            if next <= self.len && self.tree[next] <= target {
                target -= self.tree[next];
                pos = next;
            }
            step >>= 1;
        }
        pos
    }
}

/// Immutable per-height weighted distribution over ANV entries.
pub struct AnvDistribution {
    entries: Vec<AddressAnv>,
    index: WeightIndex,
    anv_by_address: HashMap<Address, u64>,
    total: u128,
}

impl AnvDistribution {
    /// Build a distribution from a raw snapshot.
    ///
    /// Duplicate addresses collapse to the last entry seen; zero-ANV
    /// entries are dropped. The result is empty iff no entry carries
    /// positive weight.
    pub fn new(snapshot: impl IntoIterator<Item = AddressAnv>) -> Self {
        let deduped: BTreeMap<Address, AddressAnv> = snapshot
            .into_iter()
            .map(|e| (e.address, e))
            .collect();

        let entries: Vec<AddressAnv> = deduped.into_values().filter(|e| e.anv > 0).collect();
        let weights: Vec<u64> = entries.iter().map(|e| e.anv).collect();
        let index = WeightIndex::from_weights(&weights);
        let total = index.total();
        let anv_by_address = entries.iter().map(|e| (e.address, e.anv)).collect();

        Self {
            entries,
            index,
            anv_by_address,
            total,
        }
    }

    /// Deterministically draw one entry, weighted by ANV.
    ///
    /// The seed maps onto `[0, total)` and the draw lands in the first
    /// cumulative range that exceeds it, so an entry's win probability is
    /// exactly `anv / total` over uniform seeds.
    pub fn sample(&self, seed: &Hash256) -> Result<&AddressAnv, SelectionError> {
        if self.total == 0 {
            return Err(SelectionError::EmptyDistribution);
        }
        let draw = draw_value(seed, self.total);
        Ok(&self.entries[self.index.find(draw)])
    }

    /// Number of distinct addresses carrying positive weight.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> u128 {
        self.total
    }

    /// The ANV of an address in this snapshot, if present.
    pub fn anv_of(&self, address: &Address) -> Option<u64> {
        self.anv_by_address.get(address).copied()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.anv_by_address.contains_key(address)
    }

    pub(crate) fn entries(&self) -> &[AddressAnv] {
        &self.entries
    }

    pub(crate) fn index(&self) -> &WeightIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use vine_core::types::AddressType;

    fn entry(seed: u8, anv: u64) -> AddressAnv {
        AddressAnv {
            address: Address([seed; 20]),
            address_type: AddressType::Key,
            anv,
        }
    }

    /// Seed whose low 16 bytes encode `v`, so `draw_value(seed, total) ==
    /// v % total`.
    fn seed_for_draw(v: u128) -> Hash256 {
        let mut bytes = [0u8; 32];
        bytes[..16].copy_from_slice(&v.to_le_bytes());
        Hash256(bytes)
    }

    fn abc() -> AnvDistribution {
        AnvDistribution::new([entry(1, 10), entry(2, 30), entry(3, 60)])
    }

    // --- WeightIndex ---

    #[test]
    fn index_prefix_and_find() {
        let idx = WeightIndex::from_weights(&[10, 30, 60]);
        assert_eq!(idx.total(), 100);
        assert_eq!(idx.find(0), 0);
        assert_eq!(idx.find(9), 0);
        assert_eq!(idx.find(10), 1);
        assert_eq!(idx.find(39), 1);
        assert_eq!(idx.find(40), 2);
        assert_eq!(idx.find(99), 2);
    }

    #[test]
    fn index_sub_removes_weight() {
        let mut idx = WeightIndex::from_weights(&[10, 30, 60]);
        idx.sub(1, 30);
        assert_eq!(idx.total(), 70);
        // B's range is gone; draws past A land in C.
        assert_eq!(idx.find(9), 0);
        assert_eq!(idx.find(10), 2);
        assert_eq!(idx.find(69), 2);
    }

    // --- cumulative-range draws ---

    #[test]
    fn draw_lands_in_cumulative_ranges() {
        let dist = abc();
        // Ranges: A [0,10), B [10,40), C [40,100).
        assert_eq!(dist.sample(&seed_for_draw(0)).unwrap().address, Address([1; 20]));
        assert_eq!(dist.sample(&seed_for_draw(9)).unwrap().address, Address([1; 20]));
        assert_eq!(dist.sample(&seed_for_draw(10)).unwrap().address, Address([2; 20]));
        assert_eq!(dist.sample(&seed_for_draw(39)).unwrap().address, Address([2; 20]));
        assert_eq!(dist.sample(&seed_for_draw(40)).unwrap().address, Address([3; 20]));
        assert_eq!(dist.sample(&seed_for_draw(45)).unwrap().address, Address([3; 20]));
        assert_eq!(dist.sample(&seed_for_draw(99)).unwrap().address, Address([3; 20]));
    }

    #[test]
    fn sample_is_deterministic() {
        let dist = abc();
        let seed = vine_core::hashing::sha256d(b"block seed");
        let a = dist.sample(&seed).unwrap().address;
        for _ in 0..10 {
            assert_eq!(dist.sample(&seed).unwrap().address, a);
        }
    }

    #[test]
    fn empty_distribution_errors() {
        let dist = AnvDistribution::new([]);
        assert_eq!(dist.size(), 0);
        assert!(dist.is_empty());
        assert_eq!(
            dist.sample(&seed_for_draw(0)),
            Err(SelectionError::EmptyDistribution)
        );
    }

    #[test]
    fn all_zero_weights_is_empty() {
        let dist = AnvDistribution::new([entry(1, 0), entry(2, 0)]);
        assert!(dist.is_empty());
        assert_eq!(dist.total_weight(), 0);
        assert!(dist.sample(&seed_for_draw(0)).is_err());
    }

    #[test]
    fn zero_weight_entries_are_dropped() {
        let dist = AnvDistribution::new([entry(1, 10), entry(2, 0), entry(3, 5)]);
        assert_eq!(dist.size(), 2);
        assert_eq!(dist.total_weight(), 15);
        assert!(!dist.contains(&Address([2; 20])));
    }

    #[test]
    fn duplicate_addresses_collapse_to_last() {
        let dist = AnvDistribution::new([entry(1, 10), entry(1, 25)]);
        assert_eq!(dist.size(), 1);
        assert_eq!(dist.total_weight(), 25);
        assert_eq!(dist.anv_of(&Address([1; 20])), Some(25));
    }

    #[test]
    fn entries_ordered_by_address_bytes() {
        let dist = AnvDistribution::new([entry(9, 1), entry(1, 1), entry(5, 1)]);
        let addrs: Vec<_> = dist.entries().iter().map(|e| e.address).collect();
        assert_eq!(addrs, vec![Address([1; 20]), Address([5; 20]), Address([9; 20])]);
    }

    #[test]
    fn reverse_map_matches_snapshot() {
        let dist = abc();
        assert_eq!(dist.anv_of(&Address([1; 20])), Some(10));
        assert_eq!(dist.anv_of(&Address([3; 20])), Some(60));
        assert_eq!(dist.anv_of(&Address([4; 20])), None);
    }

    #[test]
    fn proportionality_over_many_seeds() {
        let dist = abc();
        let mut c_wins = 0usize;
        let n = 3000u64;
        for i in 0..n {
            let seed = vine_core::hashing::sha256d(&i.to_le_bytes());
            if dist.sample(&seed).unwrap().address == Address([3; 20]) {
                c_wins += 1;
            }
        }
        // C holds 60% of the weight; allow a wide statistical band.
        let freq = c_wins as f64 / n as f64;
        assert!((0.54..=0.66).contains(&freq), "C won {freq} of draws");
    }

    // --- properties ---

    proptest! {
        #[test]
        fn total_is_sum_of_distinct_positive_weights(
            weights in proptest::collection::vec(0u64..1_000_000, 0..40)
        ) {
            let entries: Vec<AddressAnv> = weights
                .iter()
                .enumerate()
                .map(|(i, &w)| AddressAnv {
                    address: Address([i as u8; 20]),
                    address_type: AddressType::Key,
                    anv: w,
                })
                .collect();
            let expected: u128 = weights.iter().filter(|&&w| w > 0).map(|&w| w as u128).sum();
            let dist = AnvDistribution::new(entries);
            prop_assert_eq!(dist.total_weight(), expected);
        }

        #[test]
        fn sample_never_returns_zero_weight(
            weights in proptest::collection::vec(0u64..100, 1..20),
            seed_bytes in prop::array::uniform32(any::<u8>()),
        ) {
            let entries: Vec<AddressAnv> = weights
                .iter()
                .enumerate()
                .map(|(i, &w)| AddressAnv {
                    address: Address([i as u8; 20]),
                    address_type: AddressType::Key,
                    anv: w,
                })
                .collect();
            let dist = AnvDistribution::new(entries);
            match dist.sample(&Hash256(seed_bytes)) {
                Ok(winner) => prop_assert!(winner.anv > 0),
                Err(SelectionError::EmptyDistribution) => prop_assert!(dist.is_empty()),
                Err(e) => return Err(TestCaseError::fail(e.to_string())),
            }
        }
    }
}
