//! # vine-core
//! Foundation types and traits for the Vine protocol.

pub mod alias;
pub mod constants;
pub mod error;
pub mod hashing;
pub mod kdf;
pub mod traits;
pub mod types;
