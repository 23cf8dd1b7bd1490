//! # vine-referral
//! Referral-graph state for the Vine protocol: a RocksDB-backed store,
//! an in-memory store for tests and tooling, and the write-through cache
//! consensus code reads from.

pub mod cache;
pub mod memory;
pub mod store;

pub use cache::ReferralCache;
pub use memory::MemoryReferralStore;
pub use store::RocksReferralStore;
