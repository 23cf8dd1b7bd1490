//! # vine-cuckoo
//! The graph-cycle proof-of-work puzzle: block admission requires a
//! fixed-length cycle in a SipHash-keyed bipartite graph whose hash meets
//! the difficulty target.

pub mod miner;
pub mod siphash;

pub use miner::{cycle_hash, find_proof_of_work, meets_difficulty, verify_proof_of_work};
pub use siphash::SipKeys;
