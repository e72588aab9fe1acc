use crate::{error::Result, util::ser::Binary};
use std::ops::Deref;

/// A cryptographic hash. By defining this as an enum, we allow expansion of
/// hash algorithms in the future.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Hash {
    /// Blake3 256bit hash
    Blake3(Binary<32>),
}

impl Hash {
    /// Create a new blake3 hash from a message
    pub fn new_blake3(message: &[u8]) -> Result<Self> {
        let hash = blake3::hash(message);
        Ok(Self::Blake3(Binary::new(*hash.as_bytes())))
    }

    /// Return the byte slice representing this hash.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Blake3(bin) => bin.deref(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[test]
    fn hash_blake3() {
        let msg = b"that kook dropped in on me. we need to send him a (cryptographically hashed) message.";
        let hash = Hash::new_blake3(&msg[..]).unwrap();
        assert_eq!(hash.as_bytes(), blake3::hash(msg).as_bytes());
        assert_eq!(hash, Hash::new_blake3(&msg[..]).unwrap());
        assert!(hash != Hash::new_blake3(b"that kook").unwrap());
        assert_eq!(hash.as_bytes().len(), 32);
    }
}
