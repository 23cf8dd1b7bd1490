//! Shared test helpers for integration and determinism tests.

use vine_core::types::*;

/// Address from a seed byte.
pub fn addr(seed: u8) -> Address {
    Address([seed; 20])
}

/// Hash from a seed byte.
pub fn hash(seed: u8) -> Hash256 {
    Hash256([seed; 32])
}

/// Referral for `addr(seed)` under parent `addr(parent_seed)`.
pub fn make_referral(seed: u8, parent_seed: u8, alias: &str) -> Referral {
    Referral {
        address: addr(seed),
        address_type: AddressType::Key,
        alias: alias.to_string(),
        parent_address: addr(parent_seed),
        hash: hash(seed),
    }
}

/// ANV snapshot entry for `addr(seed)`.
pub fn make_anv(seed: u8, anv: u64) -> AddressAnv {
    AddressAnv {
        address: addr(seed),
        address_type: AddressType::Key,
        anv,
    }
}
