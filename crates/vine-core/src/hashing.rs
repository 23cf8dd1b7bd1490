//! Deterministic hashing helpers for the selection engine.
//!
//! Consensus code must reproduce bit-identical results on every node, so
//! every derivation here is an explicit byte layout over fixed-width
//! integers. No floating point, no platform-dependent RNG.

use sha2::{Digest, Sha256};

use crate::types::{Address, Hash256};

/// Double SHA-256 over a byte slice.
pub fn sha256d(data: &[u8]) -> Hash256 {
    let first = Sha256::digest(data);
    Hash256(Sha256::digest(first).into())
}

/// Derive the seed for the next lottery draw from the previous seed and
/// the winner's address.
///
/// Protocol constant: `next = SHA-256d(prev_seed || winner_address)`.
/// Chaining on the winner makes consecutive draws independent-looking while
/// staying fully reproducible from the initial seed.
pub fn next_seed(prev: &Hash256, winner: &Address) -> Hash256 {
    let mut data = [0u8; 52];
    data[..32].copy_from_slice(prev.as_bytes());
    data[32..].copy_from_slice(winner.as_bytes());
    sha256d(&data)
}

/// Map a seed hash onto a draw value in `[0, total)`.
///
/// Protocol constant: the first 16 bytes of the seed, interpreted as a
/// little-endian u128, reduced modulo `total`. Cumulative ANV weights are
/// u128, so the reduction never truncates a weight.
///
/// `total` must be non-zero; callers check for an empty distribution first.
pub fn draw_value(seed: &Hash256, total: u128) -> u128 {
    debug_assert!(total > 0, "draw over an empty range");
    let lo: [u8; 16] = seed.as_bytes()[..16].try_into().expect("seed is 32 bytes");
    u128::from_le_bytes(lo) % total
}
