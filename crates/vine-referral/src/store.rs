//! RocksDB-backed persistent referral store.
//!
//! Implements [`ReferralStore`] and [`AnvSnapshotProvider`] using column
//! families for referral records, the alias and hash secondary indexes,
//! confirmation counts, and per-height ANV snapshots. All multi-key
//! mutations use atomic [`WriteBatch`] for crash safety.

use std::path::Path;

use rocksdb::{ColumnFamilyDescriptor, DB, Options, SliceTransform, WriteBatch};

use vine_core::error::StoreError;
use vine_core::traits::{AnvSnapshotProvider, ReferralStore};
use vine_core::types::{Address, AddressAnv, AddressType, Hash256, Referral};

// --- Column family names ---

const CF_REFERRALS: &str = "referrals";
const CF_ALIAS_INDEX: &str = "alias_index";
const CF_HASH_INDEX: &str = "hash_index";
const CF_CONFIRMATIONS: &str = "confirmations";
const CF_ANVS: &str = "anvs";

/// All column family names.
const ALL_CFS: &[&str] = &[
    CF_REFERRALS,
    CF_ALIAS_INDEX,
    CF_HASH_INDEX,
    CF_CONFIRMATIONS,
    CF_ANVS,
];

/// ANV snapshot keys are `height(BE) || address`; the height prefix drives
/// per-snapshot iteration.
const ANV_HEIGHT_PREFIX_LEN: usize = 8;

/// RocksDB-backed persistent referral store.
///
/// Referral records are keyed by address; the alias and hash indexes map
/// back to the owning address. Confirmation counts and ANV snapshots live
/// in their own column families so the lottery can read snapshots without
/// touching graph records.
pub struct RocksReferralStore {
    db: DB,
}

impl RocksReferralStore {
    /// Open or create a database at the given path, creating all column
    /// families as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| {
                let mut opts = Options::default();
                if *name == CF_ANVS {
                    opts.set_prefix_extractor(SliceTransform::create_fixed_prefix(
                        ANV_HEIGHT_PREFIX_LEN,
                    ));
                }
                ColumnFamilyDescriptor::new(*name, opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cf_descriptors)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { db })
    }

    /// Record an address's ANV in the snapshot for `height`, overwriting any
    /// previous entry for that address at that height.
    pub fn set_anv(&self, height: u64, entry: &AddressAnv) -> Result<(), StoreError> {
        let cf = self.cf_handle(CF_ANVS)?;
        self.db
            .put_cf(
                &cf,
                Self::anv_key(height, &entry.address),
                Self::encode_typed_u64(entry.address_type, entry.anv),
            )
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    /// Flush all in-memory buffers to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    /// Trigger manual compaction across all column families.
    pub fn compact(&self) -> Result<(), StoreError> {
        for cf_name in ALL_CFS {
            let cf = self.cf_handle(cf_name)?;
            self.db.compact_range_cf(&cf, None::<&[u8]>, None::<&[u8]>);
        }
        Ok(())
    }

    // --- Internal helpers ---

    /// Get a column family handle.
    fn cf_handle(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("missing column family: {name}")))
    }

    /// Encode an ANV snapshot key: `height(BE) || address`.
    fn anv_key(height: u64, address: &Address) -> [u8; 28] {
        let mut key = [0u8; 28];
        key[..8].copy_from_slice(&height.to_be_bytes());
        key[8..].copy_from_slice(address.as_bytes());
        key
    }

    /// Encode a `(type, value)` pair: 1 type tag byte + 8 LE value bytes.
    fn encode_typed_u64(address_type: AddressType, value: u64) -> [u8; 9] {
        let mut out = [0u8; 9];
        out[0] = address_type.as_byte();
        out[1..].copy_from_slice(&value.to_le_bytes());
        out
    }

    /// Decode a `(type, value)` pair written by [`Self::encode_typed_u64`].
    fn decode_typed_u64(key: &str, bytes: &[u8]) -> Result<(AddressType, u64), StoreError> {
        if bytes.len() != 9 {
            return Err(StoreError::CorruptRecord(key.to_string()));
        }
        let address_type =
            AddressType::from_byte(bytes[0]).ok_or(StoreError::UnknownAddressType(bytes[0]))?;
        let value = u64::from_le_bytes(
            bytes[1..]
                .try_into()
                .map_err(|_| StoreError::CorruptRecord(key.to_string()))?,
        );
        Ok((address_type, value))
    }

    fn decode_referral(bytes: &[u8]) -> Result<Referral, StoreError> {
        let (referral, _) = bincode::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(referral)
    }

    fn decode_address(key: &str, bytes: &[u8]) -> Result<Address, StoreError> {
        let raw: [u8; 20] = bytes
            .try_into()
            .map_err(|_| StoreError::CorruptRecord(key.to_string()))?;
        Ok(Address(raw))
    }

    fn get_raw(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let cf = self.cf_handle(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

impl ReferralStore for RocksReferralStore {
    fn get_referral_by_address(&self, address: &Address) -> Result<Option<Referral>, StoreError> {
        match self.get_raw(CF_REFERRALS, address.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode_referral(&bytes)?)),
            None => Ok(None),
        }
    }

    fn get_referral_by_alias(&self, alias: &str) -> Result<Option<Referral>, StoreError> {
        match self.get_raw(CF_ALIAS_INDEX, alias.as_bytes())? {
            Some(bytes) => {
                let address = Self::decode_address(alias, &bytes)?;
                self.get_referral_by_address(&address)
            }
            None => Ok(None),
        }
    }

    fn get_referral_by_hash(&self, hash: &Hash256) -> Result<Option<Referral>, StoreError> {
        match self.get_raw(CF_HASH_INDEX, hash.as_bytes())? {
            Some(bytes) => {
                let address = Self::decode_address(&hash.to_string(), &bytes)?;
                self.get_referral_by_address(&address)
            }
            None => Ok(None),
        }
    }

    fn insert_referral(&self, referral: &Referral) -> Result<(), StoreError> {
        let value = bincode::encode_to_vec(referral, bincode::config::standard())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // A re-beacon may change the alias; drop the stale index entry.
        let previous = self.get_referral_by_address(&referral.address)?;

        let cf_referrals = self.cf_handle(CF_REFERRALS)?;
        let cf_alias = self.cf_handle(CF_ALIAS_INDEX)?;
        let cf_hash = self.cf_handle(CF_HASH_INDEX)?;

        let mut batch = WriteBatch::default();
        if let Some(prev) = previous {
            if !prev.alias.is_empty() && prev.alias != referral.alias {
                batch.delete_cf(cf_alias, prev.alias.as_bytes());
            }
            if prev.hash != referral.hash {
                batch.delete_cf(cf_hash, prev.hash.as_bytes());
            }
        }
        batch.put_cf(cf_referrals, referral.address.as_bytes(), &value);
        if !referral.alias.is_empty() {
            batch.put_cf(cf_alias, referral.alias.as_bytes(), referral.address.as_bytes());
        }
        batch.put_cf(cf_hash, referral.hash.as_bytes(), referral.address.as_bytes());

        self.db
            .write(batch)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn remove_referral(&self, address: &Address) -> Result<bool, StoreError> {
        let Some(referral) = self.get_referral_by_address(address)? else {
            return Ok(false);
        };

        let cf_referrals = self.cf_handle(CF_REFERRALS)?;
        let cf_alias = self.cf_handle(CF_ALIAS_INDEX)?;
        let cf_hash = self.cf_handle(CF_HASH_INDEX)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(cf_referrals, address.as_bytes());
        if !referral.alias.is_empty() {
            batch.delete_cf(cf_alias, referral.alias.as_bytes());
        }
        batch.delete_cf(cf_hash, referral.hash.as_bytes());

        self.db
            .write(batch)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(true)
    }

    fn remove_alias(&self, address: &Address) -> Result<bool, StoreError> {
        let Some(mut referral) = self.get_referral_by_address(address)? else {
            return Ok(false);
        };
        if referral.alias.is_empty() {
            return Ok(false);
        }

        let cf_referrals = self.cf_handle(CF_REFERRALS)?;
        let cf_alias = self.cf_handle(CF_ALIAS_INDEX)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(cf_alias, referral.alias.as_bytes());
        referral.alias.clear();
        let value = bincode::encode_to_vec(&referral, bincode::config::standard())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        batch.put_cf(cf_referrals, address.as_bytes(), &value);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(true)
    }

    fn update_confirmation(
        &self,
        address_type: AddressType,
        address: &Address,
        delta: i64,
    ) -> Result<Option<u64>, StoreError> {
        let current = self.get_confirmation(address)?;
        let Some(next) = current.checked_add_signed(delta) else {
            return Ok(None);
        };

        let cf = self.cf_handle(CF_CONFIRMATIONS)?;
        self.db
            .put_cf(
                &cf,
                address.as_bytes(),
                Self::encode_typed_u64(address_type, next),
            )
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Some(next))
    }

    fn get_confirmation(&self, address: &Address) -> Result<u64, StoreError> {
        match self.get_raw(CF_CONFIRMATIONS, address.as_bytes())? {
            Some(bytes) => {
                let (_, count) = Self::decode_typed_u64(&address.to_string(), &bytes)?;
                Ok(count)
            }
            None => Ok(0),
        }
    }
}

impl AnvSnapshotProvider for RocksReferralStore {
    fn anv_snapshot(&self, height: u64) -> Result<Vec<AddressAnv>, StoreError> {
        let cf = self.cf_handle(CF_ANVS)?;
        let prefix = height.to_be_bytes();

        let mut entries = Vec::new();
        for item in self.db.prefix_iterator_cf(&cf, prefix) {
            let (key, value) = item.map_err(|e| StoreError::Backend(e.to_string()))?;

            // prefix_iterator may overshoot into the next height.
            if key.len() != 28 || key[..8] != prefix {
                break;
            }

            let address = Self::decode_address("anv key", &key[8..])?;
            let (address_type, anv) = Self::decode_typed_u64(&address.to_string(), &value)?;
            entries.push(AddressAnv {
                address,
                address_type,
                anv,
            });
        }
        Ok(entries)
    }

    fn anv_of(&self, height: u64, address: &Address) -> Result<u64, StoreError> {
        match self.get_raw(CF_ANVS, &Self::anv_key(height, address))? {
            Some(bytes) => {
                let (_, anv) = Self::decode_typed_u64(&address.to_string(), &bytes)?;
                Ok(anv)
            }
            None => Ok(0),
        }
    }
}
