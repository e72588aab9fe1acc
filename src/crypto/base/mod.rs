//! The crypto base wraps the concrete algorithms for symmetric encryption,
//! signing, hashing, and key derivation that back the standard
//! [`Primitives`][crate::crypto::Primitives] implementation.
//!
//! Each primitive is an enum so that further algorithms can be added without
//! building new interfaces around them.

use crate::{
    error::{Error, Result},
    util::ser::BinarySecret,
};
use rand::{rngs::OsRng, RngCore, SeedableRng};

mod hash;
mod secret_key;
mod sign_key;

pub use hash::*;
pub use secret_key::*;
pub use sign_key::*;

/// A constant that provides a default for CPU difficulty for interactive key derivation
pub const KDF_OPS_INTERACTIVE: u32 = 2;
/// A constant that provides a default for mem difficulty for interactive key derivation
pub const KDF_MEM_INTERACTIVE: u32 = 65536;

/// A constant that provides a default for CPU difficulty for moderate key derivation
pub const KDF_OPS_MODERATE: u32 = 3;
/// A constant that provides a default for mem difficulty for moderate key derivation
pub const KDF_MEM_MODERATE: u32 = 262144;

/// A constant that provides a default for CPU difficulty for sensitive key derivation
pub const KDF_OPS_SENSITIVE: u32 = 4;
/// A constant that provides a default for mem difficulty for sensitive key derivation
pub const KDF_MEM_SENSITIVE: u32 = 1048576;

/// The blake3 derivation context used to turn a secret into a signing seed.
/// Changing this changes every key ever derived.
pub const SEED_CONTEXT: &str = "stamp-record 2024-03-01 keypair seed v1";

/// A convenience function that returns a ChaCha20 CSRNG seeded with OS random bytes.
pub fn rng_chacha20() -> rand_chacha::ChaCha20Rng {
    let mut seed_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut seed_bytes);
    rand_chacha::ChaCha20Rng::from_seed(seed_bytes)
}

/// Derive a 32-byte seed from a secret with a single keyed blake3 pass.
///
/// This is fast, which is great for throughput and terrible against someone
/// guessing low-entropy secrets offline. See [`derive_secret_key`].
pub fn derive_seed_blake3(secret: &[u8]) -> BinarySecret<32> {
    BinarySecret::new(blake3::derive_key(SEED_CONTEXT, secret))
}

/// Generate a secret key from a passphrase/salt using argon2id.
pub fn derive_secret_key(passphrase: &[u8], salt_bytes: &[u8], ops: u32, mem: u32) -> Result<BinarySecret<32>> {
    const LEN: usize = 32;
    let salt: &[u8; 16] = salt_bytes
        .get(0..16)
        .ok_or(Error::CryptoBadSalt)?
        .try_into()
        .map_err(|_| Error::CryptoBadSalt)?;
    let mut key = [0u8; LEN];
    let argon2_ctx = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2::Params::new(mem, ops, 1, Some(LEN)).map_err(|_| Error::CryptoKDFFailed)?,
    );
    argon2_ctx
        .hash_password_into(passphrase, salt, &mut key)
        .map_err(|_| Error::CryptoKDFFailed)?;
    Ok(BinarySecret::new(key))
}

/// Given the bytes from a secret key, derive some other key of N length in a secure manner.
pub fn stretch_key<const N: usize>(input: &[u8], output: &mut [u8; N], info: Option<&[u8]>, salt: Option<&[u8]>) -> Result<()> {
    let hkdf = hkdf::SimpleHkdf::<blake3::Hasher>::new(salt, input);
    hkdf.expand(info.unwrap_or(b"stamp-record/hkdf"), output)
        .map_err(|_| Error::CryptoHKDFFailed)?;
    Ok(())
}
