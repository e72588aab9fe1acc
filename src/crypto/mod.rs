//! The crypto module holds the capability set every record operation is built
//! on: key derivation, encryption, hashing, signing, verification, and a clock.
//!
//! The record protocol never names an algorithm. It talks to a [`Primitives`]
//! implementation handed to it by the caller, and [`StandardPrimitives`] is
//! the one we ship (blake3 or argon2id for derivation, ed25519 for signatures,
//! xchacha20poly1305 for payloads).
//!
//! Every primitive returns a [`Result`]. A failing primitive stops whatever
//! operation called it; nothing ever carries on with blank key material.

pub mod base;
mod standard;

use crate::{error::Result, util::Timestamp};
use zeroize::Zeroizing;

pub use standard::StandardPrimitives;

/// A keypair derived from an owner's secret.
///
/// The byte layout of both halves belongs to whatever [`Primitives`] created
/// it. The secret half is wiped on drop.
#[derive(Clone, getset::Getters)]
#[getset(get = "pub")]
pub struct KeyPair {
    /// The public half, exactly as it is embedded in records
    public: Vec<u8>,
    /// The private half
    secret: Zeroizing<Vec<u8>>,
}

impl KeyPair {
    /// Create a new keypair from its halves.
    pub fn new(public: Vec<u8>, secret: Vec<u8>) -> Self {
        Self {
            public,
            secret: Zeroizing::new(secret),
        }
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// The injected cryptographic capabilities.
pub trait Primitives {
    /// Deterministically derive a keypair from a secret. The same secret must
    /// always produce the same keypair.
    fn derive_keypair(&self, secret: &[u8]) -> Result<KeyPair>;

    /// Encrypt a payload such that only the keypair's owner can read it.
    fn encrypt(&self, plaintext: &[u8], keypair: &KeyPair) -> Result<Vec<u8>>;

    /// Reverse [`Primitives::encrypt`].
    fn decrypt(&self, ciphertext: &[u8], keypair: &KeyPair) -> Result<Vec<u8>>;

    /// One-way hash of some data.
    fn hash(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Sign a digest with the keypair's secret half.
    fn sign(&self, digest: &[u8], keypair: &KeyPair) -> Result<Vec<u8>>;

    /// Check a signature over a digest. Malformed keys or signatures are simply
    /// not valid (`Ok(false)`); `Err` is reserved for the primitive itself
    /// failing.
    fn verify(&self, digest: &[u8], public_key: &[u8], signature: &[u8]) -> Result<bool>;

    /// The current time.
    fn now(&self) -> Result<Timestamp>;
}

impl<P: Primitives + ?Sized> Primitives for &P {
    fn derive_keypair(&self, secret: &[u8]) -> Result<KeyPair> {
        (**self).derive_keypair(secret)
    }

    fn encrypt(&self, plaintext: &[u8], keypair: &KeyPair) -> Result<Vec<u8>> {
        (**self).encrypt(plaintext, keypair)
    }

    fn decrypt(&self, ciphertext: &[u8], keypair: &KeyPair) -> Result<Vec<u8>> {
        (**self).decrypt(ciphertext, keypair)
    }

    fn hash(&self, data: &[u8]) -> Result<Vec<u8>> {
        (**self).hash(data)
    }

    fn sign(&self, digest: &[u8], keypair: &KeyPair) -> Result<Vec<u8>> {
        (**self).sign(digest, keypair)
    }

    fn verify(&self, digest: &[u8], public_key: &[u8], signature: &[u8]) -> Result<bool> {
        (**self).verify(digest, public_key, signature)
    }

    fn now(&self) -> Result<Timestamp> {
        (**self).now()
    }
}
