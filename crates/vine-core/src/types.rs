//! Core protocol types: addresses, referrals, confirmation records.
//!
//! All monetary/weight values are in vines (1 VINE = 10^8 vines) and use
//! u64 per protocol convention. Signed deltas use i64.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte hash value.
///
/// Used for referral content hashes (double SHA-256), block header hashes,
/// and lottery seed values.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash (32 zero bytes).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a Hash256 from a byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A 20-byte network participant identifier, derived from a public key.
///
/// Immutable once assigned. Orderable so that deterministic structures
/// (the ANV cumulative index, invite sets) sort by address bytes.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address. Used as an absent-parent marker for root referrals.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Create an Address from a byte array.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Participant class of an address.
///
/// Determines lottery eligibility: key and script destinations can win the
/// ambassador lottery, parameterized (contract-style) destinations cannot.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default,
    bincode::Encode, bincode::Decode,
)]
pub enum AddressType {
    /// Plain public-key destination.
    #[default]
    Key,
    /// Script-hash destination.
    Script,
    /// Parameterized script destination (contract-style, lottery-ineligible).
    Parameterized,
}

impl AddressType {
    /// Single-byte wire/store tag.
    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Key => 1,
            Self::Script => 2,
            Self::Parameterized => 3,
        }
    }

    /// Parse a wire/store tag. Returns `None` for unknown tags.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Key),
            2 => Some(Self::Script),
            3 => Some(Self::Parameterized),
            _ => None,
        }
    }
}

/// A referral record linking a newly joined address to its referrer.
///
/// Created when a participant joins the network via referral and immutable
/// thereafter; the only permitted mutation is removal. The `hash` uniquely
/// identifies the record (e.g. for block-inclusion lookup). An empty `alias`
/// means the participant registered without one.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct Referral {
    /// The newly joined (child) address.
    pub address: Address,
    /// Participant class of the child address.
    pub address_type: AddressType,
    /// Optional human-readable alias in raw (unnormalized) form. Empty = none.
    pub alias: String,
    /// The referring (parent) address. Zero for root referrals.
    pub parent_address: Address,
    /// Content hash uniquely identifying this record.
    pub hash: Hash256,
}

/// Confirmation state of an address: accumulated backing value.
///
/// An address is "confirmed" while `amount > 0`. The amount is authoritative
/// at the backing store; caches only mirror it.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct ConfirmedAddress {
    /// Participant class of the address.
    pub address_type: AddressType,
    /// The confirmed address.
    pub address: Address,
    /// Accumulated backing value in vines.
    pub amount: u64,
}

impl ConfirmedAddress {
    /// Whether the backing value counts as confirmed.
    pub fn is_confirmed(&self) -> bool {
        self.amount > 0
    }
}

/// One entry of an ANV snapshot: an address and its aggregate network value.
///
/// The ANV is the total economic value attributable to the address's
/// referral subtree at a given height, supplied by the snapshot provider
/// and treated here as an opaque non-negative lottery weight.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct AddressAnv {
    /// The weighted address.
    pub address: Address,
    /// Participant class, used for lottery eligibility filtering.
    pub address_type: AddressType,
    /// Aggregate network value in vines.
    pub anv: u64,
}
