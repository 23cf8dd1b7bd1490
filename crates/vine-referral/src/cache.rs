//! Write-through cache over a [`ReferralStore`].
//!
//! The cache fronts the durable store with hash-map lookups for the hot
//! paths: address, alias, and hash resolution plus confirmation counts.
//! Aliases are normalized at the boundary, so every key under the lock is
//! canonical.
//!
//! Lock discipline: one mutex over all cache maps, never held across a
//! store call. Mutations go to the store first and touch the cache only
//! after the store succeeds, so a failed write can never leave the cache
//! claiming state the store does not have.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use vine_core::alias;
use vine_core::error::StoreError;
use vine_core::traits::ReferralStore;
use vine_core::types::{Address, AddressType, ConfirmedAddress, Hash256, Referral};

#[derive(Default)]
struct Caches {
    by_address: HashMap<Address, Referral>,
    by_alias: HashMap<String, Address>,
    by_hash: HashMap<Hash256, Address>,
    confirmations: HashMap<Address, u64>,
}

impl Caches {
    fn insert_referral(&mut self, referral: &Referral) {
        if !referral.alias.is_empty() {
            self.by_alias.insert(referral.alias.clone(), referral.address);
        }
        self.by_hash.insert(referral.hash, referral.address);
        self.by_address.insert(referral.address, referral.clone());
    }

    fn evict_referral(&mut self, referral: &Referral) {
        self.by_address.remove(&referral.address);
        if !referral.alias.is_empty() {
            self.by_alias.remove(&referral.alias);
        }
        self.by_hash.remove(&referral.hash);
    }
}

/// Cached view of the referral graph.
///
/// Reads fill the cache on miss; writes go through to the store and update
/// the cache only on success. Negative results are not cached.
pub struct ReferralCache<S> {
    store: S,
    caches: Mutex<Caches>,
}

impl<S: ReferralStore> ReferralCache<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            caches: Mutex::new(Caches::default()),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Drop all cached entries. Used after a reorg rewinds the store
    /// underneath the cache.
    pub fn clear(&self) {
        let mut caches = self.caches.lock();
        *caches = Caches::default();
    }

    // --- lookups ---

    pub fn get_referral_by_address(
        &self,
        address: &Address,
    ) -> Result<Option<Referral>, StoreError> {
        if let Some(r) = self.caches.lock().by_address.get(address) {
            return Ok(Some(r.clone()));
        }
        let fetched = self.store.get_referral_by_address(address)?;
        if let Some(ref r) = fetched {
            self.caches.lock().insert_referral(r);
        }
        Ok(fetched)
    }

    /// Look up a referral by alias. The input is normalized first, so any
    /// formatting of the same alias resolves identically.
    pub fn get_referral_by_alias(&self, raw_alias: &str) -> Result<Option<Referral>, StoreError> {
        let key = alias::normalize(raw_alias);
        if key.is_empty() {
            return Ok(None);
        }
        let cached = self.caches.lock().by_alias.get(&key).copied();
        if let Some(address) = cached {
            return self.get_referral_by_address(&address);
        }
        let fetched = self.store.get_referral_by_alias(&key)?;
        if let Some(ref r) = fetched {
            self.caches.lock().insert_referral(r);
        }
        Ok(fetched)
    }

    pub fn get_referral_by_hash(&self, hash: &Hash256) -> Result<Option<Referral>, StoreError> {
        let cached = self.caches.lock().by_hash.get(hash).copied();
        if let Some(address) = cached {
            return self.get_referral_by_address(&address);
        }
        let fetched = self.store.get_referral_by_hash(hash)?;
        if let Some(ref r) = fetched {
            self.caches.lock().insert_referral(r);
        }
        Ok(fetched)
    }

    pub fn exists_address(&self, address: &Address) -> Result<bool, StoreError> {
        Ok(self.get_referral_by_address(address)?.is_some())
    }

    pub fn exists_alias(&self, raw_alias: &str) -> Result<bool, StoreError> {
        Ok(self.get_referral_by_alias(raw_alias)?.is_some())
    }

    pub fn exists_hash(&self, hash: &Hash256) -> Result<bool, StoreError> {
        Ok(self.get_referral_by_hash(hash)?.is_some())
    }

    // --- mutations ---

    /// Insert a referral, normalizing its alias to canonical form.
    pub fn insert_referral(&self, referral: &Referral) -> Result<(), StoreError> {
        let mut canonical = referral.clone();
        canonical.alias = alias::normalize(&referral.alias);

        self.store.insert_referral(&canonical)?;

        let mut caches = self.caches.lock();
        // A re-beacon may have changed the alias; drop the stale mapping.
        if let Some(prev) = caches.by_address.get(&canonical.address).cloned() {
            caches.evict_referral(&prev);
        }
        caches.insert_referral(&canonical);
        drop(caches);

        debug!(address = %canonical.address, alias = %canonical.alias, "referral inserted");
        Ok(())
    }

    /// Remove a referral. The store is updated first; the cache is evicted
    /// only once the store confirms, so a store failure leaves the cache
    /// consistent with durable state.
    pub fn remove_referral(&self, address: &Address) -> Result<bool, StoreError> {
        // Resolve before removal so the eviction knows the alias and hash.
        let existing = self.get_referral_by_address(address)?;

        let removed = self.store.remove_referral(address)?;
        if removed {
            if let Some(ref r) = existing {
                self.caches.lock().evict_referral(r);
            }
            debug!(address = %address, "referral removed");
        }
        Ok(removed)
    }

    // --- confirmations ---

    /// Apply a signed delta to an address's confirmation count.
    ///
    /// Returns the new total, or `None` on failure: the delta would take
    /// the count below zero (count unchanged), or the count reached zero
    /// for an address with no resolvable referral (the delta stays
    /// applied). The cached count is invalidated rather than overwritten:
    /// concurrent deltas serialize at the store, and write-backs of
    /// returned totals could land out of order. When the count reaches
    /// zero the referral's alias is unlinked at the store, so a lapsed
    /// address stops being alias-resolvable while its record survives.
    pub fn update_confirmation(
        &self,
        address_type: AddressType,
        address: &Address,
        delta: i64,
    ) -> Result<Option<u64>, StoreError> {
        let Some(total) = self.store.update_confirmation(address_type, address, delta)? else {
            return Ok(None);
        };

        self.caches.lock().confirmations.remove(address);

        if total == 0 {
            let Some(r) = self.get_referral_by_address(address)? else {
                return Ok(None);
            };
            if !r.alias.is_empty() {
                self.store.remove_alias(address)?;
                self.caches.lock().evict_referral(&r);
            }
            debug!(address = %address, "confirmation count reached zero");
        }
        Ok(Some(total))
    }

    pub fn get_confirmation(&self, address: &Address) -> Result<u64, StoreError> {
        if let Some(count) = self.caches.lock().confirmations.get(address) {
            return Ok(*count);
        }
        let count = self.store.get_confirmation(address)?;
        self.caches.lock().confirmations.insert(*address, count);
        Ok(count)
    }

    /// The full confirmation record for an address. Requires a resolvable
    /// referral; an address with no referral has no confirmation record,
    /// whatever its raw count.
    pub fn get_confirmed_address(
        &self,
        address: &Address,
    ) -> Result<Option<ConfirmedAddress>, StoreError> {
        let Some(referral) = self.get_referral_by_address(address)? else {
            return Ok(None);
        };
        let amount = self.get_confirmation(address)?;
        Ok(Some(ConfirmedAddress {
            address_type: referral.address_type,
            address: *address,
            amount,
        }))
    }

    pub fn is_confirmed_address(&self, address: &Address) -> Result<bool, StoreError> {
        Ok(self.get_confirmation(address)? > 0)
    }

    /// Whether the alias resolves to a referral whose address holds a
    /// positive confirmation count.
    pub fn is_confirmed_alias(&self, raw_alias: &str) -> Result<bool, StoreError> {
        match self.get_referral_by_alias(raw_alias)? {
            Some(r) => self.is_confirmed_address(&r.address),
            None => Ok(false),
        }
    }
}
