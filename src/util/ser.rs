//! Helpful serialization tools.
//!
//! Records travel as JSON, and JSON has no native way to carry binary data, so
//! every binary field is pushed through [`base64_encode`] on the way out and
//! [`base64_decode`] on the way in. The alphabet is URL-safe without padding,
//! and decoding is strict (no padding, no stray trailing bits) so each byte
//! string has exactly one textual form.

use crate::error::{Error, Result};
use base64::Engine;
use serde::{de::DeserializeOwned, Serialize};
use std::ops::Deref;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub(crate) fn serialize<T: Serialize>(obj: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(obj).map_err(Error::Serialize)
}

pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Convert bytes to base64
pub fn base64_encode<T: AsRef<[u8]>>(bytes: T) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes.as_ref())
}

/// Convert base64 back to bytes
pub fn base64_decode<T: AsRef<[u8]>>(bytes: T) -> Result<Vec<u8>> {
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(bytes.as_ref())?)
}

/// A default implementation for (de)serializing an object to or from its wire
/// format.
pub trait SerdeWire: Serialize + DeserializeOwned {
    /// Serialize this object
    fn to_wire(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    /// Deserialize an object
    fn from_wire(slice: &[u8]) -> Result<Self> {
        deserialize(slice)
    }
}

/// A fixed-length chunk of public bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary<const N: usize>([u8; N]);

impl<const N: usize> Binary<N> {
    /// Wrap an array
    pub fn new(arr: [u8; N]) -> Self {
        Self(arr)
    }
}

impl<const N: usize> Deref for Binary<N> {
    type Target = [u8; N];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const N: usize> AsRef<[u8]> for Binary<N> {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl<const N: usize> TryFrom<&[u8]> for Binary<N> {
    type Error = Error;

    fn try_from(slice: &[u8]) -> std::result::Result<Self, Self::Error> {
        let arr: [u8; N] = slice.try_into().map_err(|_| Error::BadLength)?;
        Ok(Self(arr))
    }
}

/// A fixed-length chunk of secret bytes. Wiped on drop, never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct BinarySecret<const N: usize>([u8; N]);

impl<const N: usize> BinarySecret<N> {
    /// Wrap an array
    pub fn new(arr: [u8; N]) -> Self {
        Self(arr)
    }

    /// Grab the secret bytes
    pub fn expose_secret(&self) -> &[u8; N] {
        &self.0
    }
}

impl<const N: usize> TryFrom<&[u8]> for BinarySecret<N> {
    type Error = Error;

    fn try_from(slice: &[u8]) -> std::result::Result<Self, Self::Error> {
        let arr: [u8; N] = slice.try_into().map_err(|_| Error::BadLength)?;
        Ok(Self(arr))
    }
}

impl<const N: usize> std::fmt::Debug for BinarySecret<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BinarySecret<{}>(<redacted>)", N)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_codec_inverts() {
        let all_bytes: Vec<u8> = (0..=255).collect();
        for len in [0, 1, 2, 3, 4, 31, 32, 33, 256] {
            let bytes: Vec<u8> = all_bytes.iter().cycle().take(len).copied().collect();
            let enc = base64_encode(&bytes);
            assert_eq!(base64_decode(&enc).unwrap(), bytes);
        }
        assert_eq!(base64_encode(b"get a job"), "Z2V0IGEgam9i");
        assert_eq!(base64_encode([251, 255]), "-_8");
    }

    #[test]
    fn base64_decode_rejects_garbage() {
        assert!(matches!(base64_decode("not base64!"), Err(Error::DeserializeBase64(_))));
        // padding is not part of our alphabet
        assert!(matches!(base64_decode("Z2V0IGEgam9iIQ=="), Err(Error::DeserializeBase64(_))));
        // standard alphabet chars are rejected
        assert!(matches!(base64_decode("+/8"), Err(Error::DeserializeBase64(_))));
        // non-canonical trailing bits are rejected, so encodings are unique
        assert!(matches!(base64_decode("-_9"), Err(Error::DeserializeBase64(_))));
    }

    #[test]
    fn binary_lengths() {
        let bin = Binary::<4>::try_from(&[1u8, 2, 3, 4][..]).unwrap();
        assert_eq!(bin.as_ref(), &[1, 2, 3, 4]);
        assert_eq!(Binary::<4>::try_from(&[1u8, 2, 3][..]), Err(Error::BadLength));
        assert!(matches!(BinarySecret::<2>::try_from(&[1u8, 2, 3][..]), Err(Error::BadLength)));
        let secret = BinarySecret::new([9u8; 3]);
        assert_eq!(format!("{:?}", secret), "BinarySecret<3>(<redacted>)");
    }
}
