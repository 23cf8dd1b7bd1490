//! Trait interfaces for the Vine protocol.
//!
//! These traits define the contracts between crates:
//! - [`ReferralStore`] — durable referral-graph state (vine-referral implements)
//! - [`AnvSnapshotProvider`] — per-height aggregate network value snapshots
//!   (vine-referral implements, backed by the same store)

use crate::error::StoreError;
use crate::types::{Address, AddressAnv, AddressType, Hash256, Referral};

/// Durable referral-graph state.
///
/// Keys are canonical: addresses by raw bytes, aliases by their normalized
/// form (callers normalize before lookup), referrals by their hash.
/// Implemented by the RocksDB-backed store in vine-referral; in-memory
/// implementations exist for tests and light tooling.
pub trait ReferralStore: Send + Sync {
    /// Look up a referral by the beaconed address. `None` if unknown.
    fn get_referral_by_address(&self, address: &Address) -> Result<Option<Referral>, StoreError>;

    /// Look up a referral by normalized alias. `None` if unknown.
    fn get_referral_by_alias(&self, alias: &str) -> Result<Option<Referral>, StoreError>;

    /// Look up a referral by its hash. `None` if unknown.
    fn get_referral_by_hash(&self, hash: &Hash256) -> Result<Option<Referral>, StoreError>;

    /// Insert a referral, indexing it by address, hash, and (when present)
    /// normalized alias. Overwrites any previous record for the address.
    fn insert_referral(&self, referral: &Referral) -> Result<(), StoreError>;

    /// Remove a referral and all its index entries. Returns whether a
    /// record existed.
    fn remove_referral(&self, address: &Address) -> Result<bool, StoreError>;

    /// Whether a referral exists for this address.
    ///
    /// Default implementation delegates to
    /// [`get_referral_by_address`](Self::get_referral_by_address).
    fn exists_address(&self, address: &Address) -> Result<bool, StoreError> {
        Ok(self.get_referral_by_address(address)?.is_some())
    }

    /// Unlink the alias of this address's referral: drop the alias index
    /// entry and clear the alias on the stored record, so the referral
    /// stays resolvable by address but no longer by alias. Returns whether
    /// an alias was removed.
    fn remove_alias(&self, address: &Address) -> Result<bool, StoreError>;

    /// Apply a signed delta to an address's confirmation count and return
    /// the new total. Returns `None` when the delta would take the count
    /// below zero; the stored count is left unchanged in that case.
    fn update_confirmation(
        &self,
        address_type: AddressType,
        address: &Address,
        delta: i64,
    ) -> Result<Option<u64>, StoreError>;

    /// Current confirmation count for an address (0 if never confirmed).
    fn get_confirmation(&self, address: &Address) -> Result<u64, StoreError>;
}

/// Aggregate network value snapshots, keyed by block height.
///
/// A snapshot is the full list of `(address, type, anv)` entries the
/// lottery samples from at that height. Entries with zero ANV may be
/// present; the distribution filters them.
pub trait AnvSnapshotProvider: Send + Sync {
    /// The ANV entries effective at `height`.
    fn anv_snapshot(&self, height: u64) -> Result<Vec<AddressAnv>, StoreError>;

    /// A single address's ANV at `height` (0 if absent from the snapshot).
    ///
    /// Default implementation scans the snapshot; stores override with a
    /// point lookup.
    fn anv_of(&self, height: u64, address: &Address) -> Result<u64, StoreError> {
        Ok(self
            .anv_snapshot(height)?
            .iter()
            .find(|e| &e.address == address)
            .map(|e| e.anv)
            .unwrap_or(0))
    }
}
