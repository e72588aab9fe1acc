use crate::store::backend::{Backend, BackendError};
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory backend. Handy for tests and for processes that don't need
/// their records to outlive them.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// How many keys are stored
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl Backend for MemoryBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), BackendError> {
        self.values.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, BackendError> {
        self.values.read().get(key).cloned().ok_or(BackendError::NotFound)
    }

    fn compare_and_swap(&self, key: &str, expected: Option<&[u8]>, value: &[u8]) -> Result<bool, BackendError> {
        let mut values = self.values.write();
        if values.get(key).map(|v| v.as_slice()) != expected {
            return Ok(false);
        }
        values.insert(key.to_string(), value.to_vec());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get() {
        let backend = MemoryBackend::new();
        assert!(backend.is_empty());
        assert!(matches!(backend.get("alice"), Err(BackendError::NotFound)));
        backend.put("alice", b"one").unwrap();
        assert_eq!(backend.get("alice").unwrap(), b"one");
        backend.put("alice", b"two").unwrap();
        assert_eq!(backend.get("alice").unwrap(), b"two");
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn compare_and_swap() {
        let backend = MemoryBackend::new();
        assert!(!backend.compare_and_swap("alice", Some(b"one"), b"two").unwrap());
        assert!(matches!(backend.get("alice"), Err(BackendError::NotFound)));
        assert!(backend.compare_and_swap("alice", None, b"one").unwrap());
        assert!(!backend.compare_and_swap("alice", None, b"two").unwrap());
        assert!(!backend.compare_and_swap("alice", Some(b"zzz"), b"two").unwrap());
        assert_eq!(backend.get("alice").unwrap(), b"one");
        assert!(backend.compare_and_swap("alice", Some(b"one"), b"two").unwrap());
        assert_eq!(backend.get("alice").unwrap(), b"two");
    }
}
