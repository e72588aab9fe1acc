//! The ownership-checked store turns "this record has a valid signature" into
//! "this record is allowed to be written".
//!
//! Ownership works on trust-on-first-use: the first valid record stored for an
//! identity binds that identity to the record's public key, forever. After
//! that, a write is only accepted if it carries the same public key, which in
//! practice means it was generated from the same secret.
//!
//! ```text
//! Unclaimed ──put(K)──> Claimed(K) ──put(K)──> Claimed(K)
//!                           │
//!                           └──put(K')──> rejected, storage untouched
//! ```
//!
//! Reads are authenticated the same way: [`Store::get`] takes a freshly signed
//! record rather than a bare identity, and only hands back what's stored if
//! the caller's key owns it.
//!
//! Writes are race-free. Writers sharing a `Store` are serialized per
//! identity, and every write is a [compare-and-swap][Backend::compare_and_swap]
//! against the exact bytes the ownership check looked at. If someone else got
//! there first, we re-read and check ownership again.

mod backend;
mod fs;
mod memory;

pub use backend::{Backend, BackendError};
pub use fs::FsBackend;
pub use memory::MemoryBackend;

use crate::{
    config::{Config, DEFAULT_MAX_SWAP_ATTEMPTS},
    crypto::{Primitives, StandardPrimitives},
    error::{Error, ErrorKind, Result},
    record::{DecodedRecord, Record},
    util::ser::SerdeWire,
};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, warn};

/// Hands out one lock per key, and forgets about locks nobody holds.
#[derive(Debug, Default)]
struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    /// Run `op` while holding the lock for `key`.
    fn with_key<T, F: FnOnce() -> T>(&self, key: &str, op: F) -> T {
        let lock = self.locks.lock().entry(key.to_string()).or_default().clone();
        let result = {
            let _held = lock.lock();
            op()
        };
        let mut locks = self.locks.lock();
        drop(lock);
        // only the map's own reference left means nobody else is waiting
        if locks.get(key).map(|l| Arc::strong_count(l) == 1).unwrap_or(false) {
            locks.remove(key);
        }
        result
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

/// An ownership-checked wrapper around a [`Backend`], keyed by identity.
#[derive(Debug)]
pub struct Store<B, P = StandardPrimitives> {
    backend: B,
    primitives: P,
    locks: KeyLocks,
    max_swap_attempts: u32,
}

impl<B: Backend> Store<B, StandardPrimitives> {
    /// Create a store using the standard primitives, configured by `config`.
    pub fn with_config(backend: B, config: &Config) -> Self {
        let mut store = Self::new(backend, StandardPrimitives::new(config));
        // every write needs at least one attempt
        store.max_swap_attempts = config.max_swap_attempts().max(1);
        store
    }
}

impl<B: Backend, P: Primitives> Store<B, P> {
    /// Create a new store.
    pub fn new(backend: B, primitives: P) -> Self {
        Self {
            backend,
            primitives,
            locks: KeyLocks::default(),
            max_swap_attempts: DEFAULT_MAX_SWAP_ATTEMPTS,
        }
    }

    /// The backend we're wrapping.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The primitives we verify with.
    pub fn primitives(&self) -> &P {
        &self.primitives
    }

    /// Store a serialized record.
    ///
    /// The record must verify. If its identity is unclaimed, the record's key
    /// claims it. If it is claimed, the record's key must be the claiming key
    /// or we return [`Error::StoreOwnershipConflict`] and change nothing.
    pub fn put(&self, record_bytes: &[u8]) -> Result<()> {
        let (record, decoded) = self.verified(record_bytes)?;
        self.locks.with_key(record.identity(), || self.claim(&decoded, record_bytes))
    }

    /// Store a record. See [`Store::put`].
    pub fn put_record(&self, record: &Record) -> Result<()> {
        self.put(&record.to_wire()?)
    }

    /// Fetch the stored record for the identity of the given (serialized)
    /// record, which acts as proof that the caller owns that identity.
    ///
    /// Fails with [`Error::StoreNotFound`] if nothing is stored,
    /// [`Error::StoreOwnershipConflict`] if the caller isn't the owner, and
    /// [`Error::StoreCorrupted`] if what's stored doesn't verify or belongs to
    /// some other identity.
    pub fn get(&self, record_bytes: &[u8]) -> Result<Vec<u8>> {
        let (record, decoded) = self.verified(record_bytes)?;
        let identity = record.identity();
        let stored_bytes = self.fetch(identity)?.ok_or(Error::StoreNotFound)?;
        let stored = self.trusted(identity, &stored_bytes)?;
        if stored.identity() != identity {
            warn!(identity = %identity, stored_identity = %stored.identity(), "stored record is filed under the wrong identity");
            Err(Error::StoreCorrupted)?;
        }
        if !stored.same_key(&decoded) {
            warn!(identity = %identity, "denied read: requester does not own identity");
            Err(Error::StoreOwnershipConflict)?;
        }
        Ok(stored_bytes)
    }

    /// Fetch a record. See [`Store::get`].
    pub fn get_record(&self, record: &Record) -> Result<Record> {
        let bytes = self.get(&record.to_wire()?)?;
        Record::from_wire(&bytes)
    }

    /// Parse and verify an incoming record, failing closed.
    fn verified(&self, record_bytes: &[u8]) -> Result<(Record, DecodedRecord)> {
        let record = Record::from_wire(record_bytes)?;
        let decoded = record.decode()?;
        match Record::verify_decoded(&self.primitives, &decoded) {
            Ok(true) => Ok((record, decoded)),
            Ok(false) => {
                warn!(identity = %record.identity(), "rejected record: signature does not verify");
                Err(Error::RecordSignatureInvalid)
            }
            Err(e) => {
                warn!(identity = %record.identity(), error = %e, "rejected record");
                Err(e)
            }
        }
    }

    /// Check that what the backend handed us verifies before we believe any
    /// of it.
    fn trusted(&self, identity: &str, stored_bytes: &[u8]) -> Result<DecodedRecord> {
        let decoded = Record::from_wire(stored_bytes).and_then(|r| r.decode());
        let verified = decoded.and_then(|d| Record::verify_decoded(&self.primitives, &d).map(|valid| (d, valid)));
        match verified {
            Ok((stored, true)) => Ok(stored),
            Err(e) if e.kind() == ErrorKind::Crypto => Err(e),
            Ok((_, false)) | Err(_) => {
                warn!(identity = %identity, "stored record does not verify");
                Err(Error::StoreCorrupted)
            }
        }
    }

    fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.backend.get(key) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(BackendError::NotFound) => Ok(None),
            Err(e) => Err(Error::Storage(e)),
        }
    }

    /// The read-compare-write loop. Must be called with the key's lock held.
    fn claim(&self, incoming: &DecodedRecord, record_bytes: &[u8]) -> Result<()> {
        let identity = incoming.identity();
        for attempt in 1..=self.max_swap_attempts {
            let existing = self.fetch(identity)?;
            if let Some(existing_bytes) = existing.as_deref() {
                let existing = Record::from_wire(existing_bytes).and_then(|r| r.decode()).map_err(|_| {
                    warn!(identity = %identity, "rejected write: stored record cannot be decoded");
                    Error::StoreCorrupted
                })?;
                if existing.identity() != identity {
                    warn!(identity = %identity, stored_identity = %existing.identity(), "rejected write: stored record is filed under the wrong identity");
                    Err(Error::StoreCorrupted)?;
                }
                if !existing.same_key(incoming) {
                    warn!(identity = %identity, "rejected write: identity is owned by another key");
                    Err(Error::StoreOwnershipConflict)?;
                }
            }
            if self.backend.compare_and_swap(identity, existing.as_deref(), record_bytes)? {
                match existing {
                    Some(_) => debug!(identity = %identity, "updated record"),
                    None => debug!(identity = %identity, "claimed identity"),
                }
                return Ok(());
            }
            debug!(identity = %identity, attempt, "record changed under us, retrying");
        }
        warn!(identity = %identity, attempts = self.max_swap_attempts, "gave up writing record");
        Err(Error::StoreContention)
    }
}
