//! PBKDF2-HMAC-SHA512 key stretching for wallet secret protection.
//!
//! Deterministic and standard (RFC 2898): an iteration count of 0 behaves
//! as 1, a zero key length is a no-op, and an empty salt is valid. Not part
//! of consensus selection; lives here so wallet tooling and the store share
//! one implementation.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::{Zeroize, Zeroizing};

use crate::error::KdfError;

type HmacSha512 = Hmac<Sha512>;

/// HMAC-SHA512 output size in bytes.
const BLOCK_LEN: usize = 64;

/// Stretch a passphrase into `key_length` bytes of key material.
///
/// The returned buffer zeroizes itself on drop.
pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8],
    iterations: u32,
    key_length: usize,
) -> Result<Zeroizing<Vec<u8>>, KdfError> {
    // PBKDF2 block counter is a u32; more blocks than that cannot be named.
    if key_length.div_ceil(BLOCK_LEN) > u32::MAX as usize {
        return Err(KdfError::OutputTooLong(key_length));
    }

    let iterations = iterations.max(1);
    let mut key = Zeroizing::new(vec![0u8; key_length]);

    for (block_index, chunk) in key.chunks_mut(BLOCK_LEN).enumerate() {
        let count = (block_index as u32) + 1;

        // U_1 = HMAC(passphrase, salt || count_be)
        let mut mac = hmac(passphrase);
        mac.update(salt);
        mac.update(&count.to_be_bytes());
        let mut digest: [u8; BLOCK_LEN] = mac.finalize().into_bytes().into();
        let mut acc = digest;

        // U_j = HMAC(passphrase, U_{j-1}); block = U_1 ^ ... ^ U_c
        for _ in 1..iterations {
            let mut mac = hmac(passphrase);
            mac.update(&digest);
            digest = mac.finalize().into_bytes().into();
            for (a, d) in acc.iter_mut().zip(digest.iter()) {
                *a ^= d;
            }
        }

        chunk.copy_from_slice(&acc[..chunk.len()]);
        digest.zeroize();
        acc.zeroize();
    }

    Ok(key)
}

fn hmac(passphrase: &[u8]) -> HmacSha512 {
    // HMAC accepts keys of any length.
    HmacSha512::new_from_slice(passphrase).expect("HMAC key length is unrestricted")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive_hex(pass: &[u8], salt: &[u8], iterations: u32, len: usize) -> String {
        hex::encode(derive_key(pass, salt, iterations, len).unwrap().as_slice())
    }

    // Published PBKDF2-HMAC-SHA512 vectors ("password"/"salt").

    #[test]
    fn vector_one_iteration() {
        assert_eq!(
            derive_hex(b"password", b"salt", 1, 64),
            "867f70cf1ade02cff3752599a3a53dc4af34c7a669815ae5d513554e1c8cf252\
             c02d470a285a0501bad999bfe943c08f050235d7d68b1da55e63f73b60a57fce"
        );
    }

    #[test]
    fn vector_two_iterations() {
        assert_eq!(
            derive_hex(b"password", b"salt", 2, 64),
            "e1d9c16aa681708a45f5c7c4e215ceb66e011a2e9f0040713f18aefdb866d53c\
             f76cab2868a39b9f7840edce4fef5a82be67335c77a6068e04112754f27ccf4e"
        );
    }

    #[test]
    fn zero_iterations_behaves_as_one() {
        let k0 = derive_key(b"password", b"salt", 0, 64).unwrap();
        let k1 = derive_key(b"password", b"salt", 1, 64).unwrap();
        assert_eq!(k0, k1);
    }

    #[test]
    fn zero_length_is_noop() {
        let k = derive_key(b"password", b"salt", 1000, 0).unwrap();
        assert!(k.is_empty());
    }

    #[test]
    fn empty_salt_is_valid() {
        let k = derive_key(b"password", b"", 10, 32).unwrap();
        assert_eq!(k.len(), 32);
    }

    #[test]
    fn truncation_is_a_prefix() {
        let long = derive_key(b"pass", b"salt", 100, 64).unwrap();
        let short = derive_key(b"pass", b"salt", 100, 20).unwrap();
        assert_eq!(&long[..20], short.as_slice());
    }

    #[test]
    fn multi_block_output() {
        let k = derive_key(b"pass", b"salt", 10, 100).unwrap();
        assert_eq!(k.len(), 100);
        // First block must match the single-block derivation.
        let first = derive_key(b"pass", b"salt", 10, 64).unwrap();
        assert_eq!(&k[..64], first.as_slice());
    }

    #[test]
    fn different_inputs_different_keys() {
        let a = derive_key(b"pass", b"salt", 10, 32).unwrap();
        let b = derive_key(b"pass", b"salt2", 10, 32).unwrap();
        let c = derive_key(b"pass2", b"salt", 10, 32).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
