//! In-memory referral store for tests and light tooling.
//!
//! Mirrors the RocksDB store's semantics exactly, including snapshot
//! ordering by address bytes, so the two are interchangeable behind the
//! [`ReferralStore`] and [`AnvSnapshotProvider`] traits.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;

use vine_core::error::StoreError;
use vine_core::traits::{AnvSnapshotProvider, ReferralStore};
use vine_core::types::{Address, AddressAnv, AddressType, Hash256, Referral};

#[derive(Default)]
struct Inner {
    referrals: HashMap<Address, Referral>,
    alias_index: HashMap<String, Address>,
    hash_index: HashMap<Hash256, Address>,
    confirmations: HashMap<Address, (AddressType, u64)>,
    // Keyed by (height, address) so snapshots come out address-ordered.
    anvs: BTreeMap<(u64, Address), (AddressType, u64)>,
}

/// In-memory [`ReferralStore`] backed by hash maps.
#[derive(Default)]
pub struct MemoryReferralStore {
    inner: Mutex<Inner>,
}

impl MemoryReferralStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an address's ANV in the snapshot for `height`.
    pub fn set_anv(&self, height: u64, entry: &AddressAnv) -> Result<(), StoreError> {
        self.inner.lock().anvs.insert(
            (height, entry.address),
            (entry.address_type, entry.anv),
        );
        Ok(())
    }
}

impl ReferralStore for MemoryReferralStore {
    fn get_referral_by_address(&self, address: &Address) -> Result<Option<Referral>, StoreError> {
        Ok(self.inner.lock().referrals.get(address).cloned())
    }

    fn get_referral_by_alias(&self, alias: &str) -> Result<Option<Referral>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .alias_index
            .get(alias)
            .and_then(|a| inner.referrals.get(a))
            .cloned())
    }

    fn get_referral_by_hash(&self, hash: &Hash256) -> Result<Option<Referral>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .hash_index
            .get(hash)
            .and_then(|a| inner.referrals.get(a))
            .cloned())
    }

    fn insert_referral(&self, referral: &Referral) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if let Some(prev) = inner.referrals.get(&referral.address).cloned() {
            if !prev.alias.is_empty() && prev.alias != referral.alias {
                inner.alias_index.remove(&prev.alias);
            }
            if prev.hash != referral.hash {
                inner.hash_index.remove(&prev.hash);
            }
        }
        if !referral.alias.is_empty() {
            inner.alias_index.insert(referral.alias.clone(), referral.address);
        }
        inner.hash_index.insert(referral.hash, referral.address);
        inner.referrals.insert(referral.address, referral.clone());
        Ok(())
    }

    fn remove_referral(&self, address: &Address) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        match inner.referrals.remove(address) {
            Some(r) => {
                if !r.alias.is_empty() {
                    inner.alias_index.remove(&r.alias);
                }
                inner.hash_index.remove(&r.hash);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_alias(&self, address: &Address) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        let Some(referral) = inner.referrals.get_mut(address) else {
            return Ok(false);
        };
        if referral.alias.is_empty() {
            return Ok(false);
        }
        let alias = std::mem::take(&mut referral.alias);
        inner.alias_index.remove(&alias);
        Ok(true)
    }

    fn update_confirmation(
        &self,
        address_type: AddressType,
        address: &Address,
        delta: i64,
    ) -> Result<Option<u64>, StoreError> {
        let mut inner = self.inner.lock();
        let current = inner
            .confirmations
            .get(address)
            .map(|(_, c)| *c)
            .unwrap_or(0);
        let Some(next) = current.checked_add_signed(delta) else {
            return Ok(None);
        };
        inner.confirmations.insert(*address, (address_type, next));
        Ok(Some(next))
    }

    fn get_confirmation(&self, address: &Address) -> Result<u64, StoreError> {
        Ok(self
            .inner
            .lock()
            .confirmations
            .get(address)
            .map(|(_, c)| *c)
            .unwrap_or(0))
    }
}

impl AnvSnapshotProvider for MemoryReferralStore {
    fn anv_snapshot(&self, height: u64) -> Result<Vec<AddressAnv>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .anvs
            .range((height, Address::ZERO)..=(height, Address([0xFF; 20])))
            .map(|((_, address), (address_type, anv))| AddressAnv {
                address: *address,
                address_type: *address_type,
                anv: *anv,
            })
            .collect())
    }

    fn anv_of(&self, height: u64, address: &Address) -> Result<u64, StoreError> {
        Ok(self
            .inner
            .lock()
            .anvs
            .get(&(height, *address))
            .map(|(_, anv)| *anv)
            .unwrap_or(0))
    }
}
