//! The main error enum for the project lives here, and documents the various
//! conditions that can arise while generating, verifying, or storing records.
//!
//! Errors are fine-grained, but every one of them belongs to exactly one
//! [`ErrorKind`], which is what callers generally want to branch on ("not yet
//! claimed" vs "wrong owner" vs "tampered" vs "transient I/O").

use crate::store::BackendError;
use thiserror::Error;

/// This is our error enum. It contains an entry for any part of the system in
/// which an expectation is not met or a problem occurs.
#[derive(Error, Debug)]
pub enum Error {
    /// A byte slice was not the length we needed it to be.
    #[error("bad length")]
    BadLength,

    /// Bad key.
    #[error("key is invalid")]
    CryptoBadKey,

    /// Bad salt given to a cryptographic function.
    #[error("incorrect salt given for kdf")]
    CryptoBadSalt,

    /// Could not stretch a key
    #[error("key stretching failed")]
    CryptoHKDFFailed,

    /// Could not generate key from password
    #[error("key derivation from password failed")]
    CryptoKDFFailed,

    /// Failed to open a sealed payload. Either it was tampered with or the
    /// wrong secret was used.
    #[error("failed to open a sealed object")]
    CryptoOpenFailed,

    /// Failed to seal a payload.
    #[error("failed to seal an object")]
    CryptoSealFailed,

    /// Failed to produce a signature
    #[error("failed to create a signature")]
    CryptoSignatureFailed,

    /// An error while engaging in deserialization.
    #[error("deserialization error")]
    Deserialize(#[from] serde_json::Error),

    /// An error while decoding a text-encoded binary field.
    #[error("deserialization error")]
    DeserializeBase64(#[from] base64::DecodeError),

    /// The record was created after "now" according to the verifier's clock.
    #[error("record timestamp is in the future")]
    RecordFutureTimestamp,

    /// The record is well-formed but its signature does not cover its
    /// contents under its embedded public key.
    #[error("the record signature does not verify")]
    RecordSignatureInvalid,

    /// The timestamp field decoded to bytes that do not describe a time.
    #[error("record timestamp is not a valid time")]
    RecordTimestampInvalid,

    /// An error while engaging in serialization.
    #[error("serialization error")]
    Serialize(#[source] serde_json::Error),

    /// The backend failed in some way other than "not found".
    #[error("storage error: {0}")]
    Storage(#[from] BackendError),

    /// Other writers kept replacing the value between our read and our write.
    #[error("gave up writing after repeated concurrent modification")]
    StoreContention,

    /// The backend holds bytes for this identity that do not verify.
    #[error("stored record is corrupted or has been tampered with")]
    StoreCorrupted,

    /// Nothing is stored for this identity.
    #[error("no record stored for this identity")]
    StoreNotFound,

    /// The identity is claimed by a different public key.
    #[error("identity is owned by a different key")]
    StoreOwnershipConflict,
}

/// The broad classes every [`Error`] falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed wire bytes or field text.
    Decode,
    /// A cryptographic primitive failed.
    Crypto,
    /// The record claims to come from the future.
    StaleOrFutureTimestamp,
    /// The signature does not verify.
    SignatureInvalid,
    /// The identity belongs to someone else.
    OwnershipConflict,
    /// The identity has not been claimed.
    NotFound,
    /// Storage returned data we cannot trust.
    StorageCorrupted,
    /// Storage failed.
    Storage,
}

impl Error {
    /// Return the class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadLength
            | Self::Deserialize(_)
            | Self::DeserializeBase64(_)
            | Self::RecordTimestampInvalid
            | Self::Serialize(_) => ErrorKind::Decode,
            Self::CryptoBadKey
            | Self::CryptoBadSalt
            | Self::CryptoHKDFFailed
            | Self::CryptoKDFFailed
            | Self::CryptoOpenFailed
            | Self::CryptoSealFailed
            | Self::CryptoSignatureFailed => ErrorKind::Crypto,
            Self::RecordFutureTimestamp => ErrorKind::StaleOrFutureTimestamp,
            Self::RecordSignatureInvalid => ErrorKind::SignatureInvalid,
            Self::StoreOwnershipConflict => ErrorKind::OwnershipConflict,
            Self::StoreNotFound => ErrorKind::NotFound,
            Self::StoreCorrupted => ErrorKind::StorageCorrupted,
            Self::Storage(_) | Self::StoreContention => ErrorKind::Storage,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        // serde_json::Error and io::Error are not eq-able, so compare what we
        // can actually see.
        format!("{:?}", self) == format!("{:?}", other)
    }
}

/// Wraps `std::result::Result` around our `Error` enum
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_variants() {
        assert_eq!(Error::BadLength.kind(), ErrorKind::Decode);
        assert_eq!(Error::RecordTimestampInvalid.kind(), ErrorKind::Decode);
        assert_eq!(Error::CryptoSealFailed.kind(), ErrorKind::Crypto);
        assert_eq!(Error::RecordFutureTimestamp.kind(), ErrorKind::StaleOrFutureTimestamp);
        assert_eq!(Error::RecordSignatureInvalid.kind(), ErrorKind::SignatureInvalid);
        assert_eq!(Error::StoreOwnershipConflict.kind(), ErrorKind::OwnershipConflict);
        assert_eq!(Error::StoreNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(Error::StoreCorrupted.kind(), ErrorKind::StorageCorrupted);
        assert_eq!(Error::StoreContention.kind(), ErrorKind::Storage);
        assert_eq!(Error::Storage(BackendError::Other("disk on fire".into())).kind(), ErrorKind::Storage);

        let json_err = serde_json::from_slice::<u8>(b"{").unwrap_err();
        assert_eq!(Error::from(json_err).kind(), ErrorKind::Decode);
    }
}
