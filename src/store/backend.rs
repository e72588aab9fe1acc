//! The storage collaborator. The store only ever needs three things from it:
//! read a key, write a key, and write a key *only if* it still holds what we
//! last read.

use std::sync::Arc;
use thiserror::Error;

/// Errors a backend can produce.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Nothing is stored under the requested key.
    #[error("key not found")]
    NotFound,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else the backend wants to complain about.
    #[error("backend error: {0}")]
    Other(String),
}

/// A key-value store.
pub trait Backend {
    /// Unconditionally write a value.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), BackendError>;

    /// Read a value. Missing keys are [`BackendError::NotFound`].
    fn get(&self, key: &str) -> Result<Vec<u8>, BackendError>;

    /// Atomically write `value` only if the key currently holds `expected`
    /// (`None` meaning the key is absent). Returns `Ok(false)` and writes
    /// nothing if the current value is something else.
    fn compare_and_swap(&self, key: &str, expected: Option<&[u8]>, value: &[u8]) -> Result<bool, BackendError>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), BackendError> {
        (**self).put(key, value)
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, BackendError> {
        (**self).get(key)
    }

    fn compare_and_swap(&self, key: &str, expected: Option<&[u8]>, value: &[u8]) -> Result<bool, BackendError> {
        (**self).compare_and_swap(key, expected, value)
    }
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), BackendError> {
        (**self).put(key, value)
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, BackendError> {
        (**self).get(key)
    }

    fn compare_and_swap(&self, key: &str, expected: Option<&[u8]>, value: &[u8]) -> Result<bool, BackendError> {
        (**self).compare_and_swap(key, expected, value)
    }
}
