//! Self-authenticating records, and a store that knows who owns them.
//!
//! A [`Record`] is a small signed envelope: an identity string, a payload
//! encrypted under a key derived from its owner's secret, the time it was
//! made, the public half of the derived signing key, and a signature binding
//! all of those together. Anyone can check that a record is internally
//! consistent without knowing anything else about it:
//!
//! ```text
//! secret ──derive──> keypair ──┬──> encrypt(payload) ──> ciphertext
//!                              │
//!            identity, ciphertext, timestamp, public key
//!                              │
//!                              └──> sign(binding digest) ──> signature
//! ```
//!
//! Because the keypair is derived deterministically from the secret, the same
//! secret always produces the same public key. That gives the [`Store`]
//! something to hang ownership on: the first valid record stored under an
//! identity claims it, and from then on only records carrying the same public
//! key may replace (or read) it.
//!
//! All of the cryptography sits behind the [`Primitives`] trait so it can be
//! swapped or faked. [`StandardPrimitives`] is the production suite:
//!
//! - Keypair derivation: blake3 (default) or Argon2id, seeding Ed25519
//! - Payload encryption: XChaCha20-Poly1305
//! - Hashing: blake3
//! - Text encoding: url-safe base64, no padding
//!
//! Records travel as JSON (see [`SerdeWire`]), with the binary fields base64
//! encoded.
//!
//! ```ignore
//! let primitives = StandardPrimitives::default();
//! let record = Record::generate(&primitives, "alice", b"correct horse", b"{\"hi\":1}")?;
//! let store = Store::new(MemoryBackend::new(), primitives);
//! store.put(&record.to_wire()?)?;
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod record;
pub mod store;
pub mod util;

pub use crate::{
    config::{Config, KdfConfig},
    crypto::{KeyPair, Primitives, StandardPrimitives},
    error::{Error, ErrorKind, Result},
    record::{verify, DecodedRecord, Record},
    store::{Backend, BackendError, FsBackend, MemoryBackend, Store},
    util::{ser::SerdeWire, Timestamp},
};
