//! Error types for the Vine protocol.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage backend: {0}")] Backend(String),
    #[error("corrupt record under key {0}")] CorruptRecord(String),
    #[error("unknown address type tag: {0}")] UnknownAddressType(u8),
    #[error("serialization: {0}")] Serialization(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("cannot sample an empty distribution")] EmptyDistribution,
    #[error(transparent)] Store(#[from] StoreError),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowError {
    #[error("cycle has {got} edges, proof size is {expected}")] WrongProofSize { got: usize, expected: usize },
    #[error("edge nonce {0} exceeds the edge mask")] NonceTooBig(u32),
    #[error("edge nonces not strictly increasing at position {0}")] NoncesOutOfOrder(usize),
    #[error("endpoints do not balance (xor mismatch)")] NonMatchingEdges,
    #[error("node visited by more than two cycle edges")] Branch,
    #[error("dead end: node visited by only one cycle edge")] DeadEnd,
    #[error("edges close a cycle shorter than the proof size")] ShortCycle,
    #[error("cycle hash does not meet the difficulty target")] DifficultyNotMet,
    #[error("edge bits {0} out of supported range")] BadEdgeBits(u8),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AliasError {
    #[error("alias is empty after normalization")] Empty,
    #[error("alias longer than {max} characters: {len}")] TooLong { len: usize, max: usize },
    #[error("invalid character in alias: {0:?}")] InvalidCharacter(char),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KdfError {
    #[error("requested key length {0} exceeds the PBKDF2 limit")] OutputTooLong(usize),
}

#[derive(Error, Debug)]
pub enum VineError {
    #[error(transparent)] Store(#[from] StoreError),
    #[error(transparent)] Selection(#[from] SelectionError),
    #[error(transparent)] Pow(#[from] PowError),
    #[error(transparent)] Alias(#[from] AliasError),
    #[error(transparent)] Kdf(#[from] KdfError),
}
