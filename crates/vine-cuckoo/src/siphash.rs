//! SipHash-2-4 edge hashing for the cycle puzzle.
//!
//! The puzzle graph is defined entirely by a SipHash key derived from the
//! block hash: edge nonce `e` connects node `siphash(2e) & mask` on the
//! U side to node `siphash(2e+1) & mask` on the V side. The single-word
//! variant here (2 compression rounds, 4 finalization rounds) is the
//! consensus-fixed edge hash, not a general-purpose hasher.

use vine_core::types::Hash256;

/// SipHash key, four little-endian words of the block hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SipKeys {
    pub k0: u64,
    pub k1: u64,
    pub k2: u64,
    pub k3: u64,
}

impl SipKeys {
    /// Derive puzzle keys from a block hash.
    pub fn from_hash(hash: &Hash256) -> Self {
        let b = hash.as_bytes();
        let word = |i: usize| {
            u64::from_le_bytes(b[i * 8..(i + 1) * 8].try_into().expect("hash is 32 bytes"))
        };
        Self {
            k0: word(0),
            k1: word(1),
            k2: word(2),
            k3: word(3),
        }
    }
}

#[inline]
fn sip_round(v0: &mut u64, v1: &mut u64, v2: &mut u64, v3: &mut u64) {
    *v0 = v0.wrapping_add(*v1);
    *v1 = v1.rotate_left(13);
    *v1 ^= *v0;
    *v0 = v0.rotate_left(32);
    *v2 = v2.wrapping_add(*v3);
    *v3 = v3.rotate_left(16);
    *v3 ^= *v2;
    *v0 = v0.wrapping_add(*v3);
    *v3 = v3.rotate_left(21);
    *v3 ^= *v0;
    *v2 = v2.wrapping_add(*v1);
    *v1 = v1.rotate_left(17);
    *v1 ^= *v2;
    *v2 = v2.rotate_left(32);
}

/// SipHash-2-4 of a single 64-bit word.
pub fn siphash24(keys: &SipKeys, data: u64) -> u64 {
    let mut v0 = keys.k0;
    let mut v1 = keys.k1;
    let mut v2 = keys.k2;
    let mut v3 = keys.k3 ^ data;

    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);

    v0 ^= data;
    v2 ^= 0xff;

    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);

    v0 ^ v1 ^ v2 ^ v3
}

/// The node an edge nonce maps to on side `uorv` (0 = U, 1 = V).
#[inline]
pub fn sip_node(keys: &SipKeys, edge_nonce: u32, uorv: u64, edge_mask: u64) -> u64 {
    siphash24(keys, 2 * edge_nonce as u64 + uorv) & edge_mask
}
