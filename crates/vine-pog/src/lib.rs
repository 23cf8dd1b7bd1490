//! # vine-pog
//! The Proof-of-Growth lottery: a deterministic ANV-weighted selection
//! engine. Every draw is a pure function of (snapshot, seed), so every
//! node reproduces the identical winner sequence.

pub mod distribution;
pub mod select;
pub mod selector;

pub use distribution::AnvDistribution;
pub use select::{is_valid_ambassador_destination, select_confirmed_addresses};
pub use selector::WalletSelector;
