//! # vine-tests
//! Cross-crate integration tests for the Vine protocol. Test-only crate,
//! never published.

pub mod helpers;
