//! Protocol constants. All monetary values in vines (1 VINE = 10^8 vines).

pub const COIN: u64 = 100_000_000;

/// Number of edges in a valid proof-of-work cycle.
pub const PROOF_SIZE: usize = 42;

/// Mainnet edge-space size exponent for the cycle puzzle: 2^27 edges.
pub const EDGE_BITS: u8 = 27;

/// Smallest edge space the solver and verifier accept.
pub const MIN_EDGE_BITS: u8 = 4;

/// Largest edge space the in-memory solver supports (node bitmaps are
/// allocated eagerly; 2^32 nodes is the u32 nonce ceiling).
pub const MAX_EDGE_BITS: u8 = 31;

/// Number of ambassador lottery winners drawn per block.
pub const AMBASSADOR_WINNERS_PER_BLOCK: usize = 5;

/// Default cap on outstanding (drawn but not yet confirmed) invites.
pub const DEFAULT_MAX_OUTSTANDING_INVITES: usize = 100;

/// Alias length bounds, measured after normalization.
pub const MIN_ALIAS_LENGTH: usize = 3;
pub const MAX_ALIAS_LENGTH: usize = 32;

/// PBKDF2 iteration count used for wallet secret stretching.
pub const WALLET_KDF_ITERATIONS: u32 = 100_000;
