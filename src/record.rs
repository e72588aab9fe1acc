//! Records are the unit of storage and transfer: a payload encrypted under a
//! key derived from its owner's secret, stamped with a time, and signed by
//! that same key.
//!
//! A record is *self-authenticating*: it carries the public key needed to
//! check it. That only proves the record is internally consistent (someone
//! holding the matching private key produced exactly these fields). Whether
//! that key has any business speaking for the record's identity is for the
//! [store][crate::store] to decide.
//!
//! The signature covers a single digest over every other field, in this
//! order:
//!
//! ```text
//! hash( len(identity)   | identity
//!     | len(ciphertext) | ciphertext
//!     | len(timestamp)  | timestamp
//!     | len(publicKey)  | publicKey )
//! ```
//!
//! where each `len` is a big-endian u64. Generation and verification both go
//! through [`binding_digest`], so they can't disagree about it.

use crate::{
    crypto::{KeyPair, Primitives},
    error::{Error, Result},
    util::{
        ser::{self, SerdeWire},
        Timestamp,
    },
};
use serde_derive::{Deserialize, Serialize};

/// A signed record, in wire form: every binary field is base64 text.
///
/// Records are immutable. "Updating" one means generating a brand new record
/// with the same identity and secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Who this record claims to belong to. Also the storage key.
    identity: String,
    /// Signature over the binding digest
    signature: String,
    /// The encrypted payload
    ciphertext: String,
    /// When the record was generated
    timestamp: String,
    /// The public half of the owner's derived keypair
    public_key: String,
}

impl SerdeWire for Record {}

/// A record with all of its binary fields decoded.
#[derive(Debug, Clone, PartialEq, Eq, getset::Getters)]
#[getset(get = "pub")]
pub struct DecodedRecord {
    identity: String,
    signature: Vec<u8>,
    ciphertext: Vec<u8>,
    /// The exact timestamp bytes that were signed
    timestamp_bytes: Vec<u8>,
    timestamp: Timestamp,
    public_key: Vec<u8>,
}

impl DecodedRecord {
    /// Whether two decoded records carry the same public key.
    pub(crate) fn same_key(&self, other: &DecodedRecord) -> bool {
        use subtle::ConstantTimeEq;
        bool::from(self.public_key.as_slice().ct_eq(other.public_key.as_slice()))
    }
}

/// Compute the digest a record's signature covers.
pub fn binding_digest<P: Primitives + ?Sized>(
    primitives: &P,
    identity: &[u8],
    ciphertext: &[u8],
    timestamp: &[u8],
    public_key: &[u8],
) -> Result<Vec<u8>> {
    let fields = [identity, ciphertext, timestamp, public_key];
    let mut framed = Vec::with_capacity(fields.iter().map(|f| f.len() + 8).sum());
    for field in fields {
        framed.extend_from_slice(&(field.len() as u64).to_be_bytes());
        framed.extend_from_slice(field);
    }
    primitives.hash(&framed)
}

impl Record {
    /// Generate a new signed record for `identity`, encrypting `payload` under
    /// a keypair derived from `secret`.
    ///
    /// If any primitive fails, so does this. There is no partial record.
    pub fn generate<P: Primitives + ?Sized>(primitives: &P, identity: &str, secret: &[u8], payload: &[u8]) -> Result<Self> {
        let keypair = primitives.derive_keypair(secret)?;
        let ciphertext = primitives.encrypt(payload, &keypair)?;
        let timestamp = primitives.now()?.to_bytes();
        let digest = binding_digest(primitives, identity.as_bytes(), &ciphertext, &timestamp, keypair.public())?;
        let signature = primitives.sign(&digest, &keypair)?;
        Ok(Self {
            identity: identity.to_string(),
            signature: ser::base64_encode(&signature),
            ciphertext: ser::base64_encode(&ciphertext),
            timestamp: ser::base64_encode(timestamp),
            public_key: ser::base64_encode(keypair.public()),
        })
    }

    /// Decode all of the binary fields in this record.
    pub fn decode(&self) -> Result<DecodedRecord> {
        let timestamp_bytes = ser::base64_decode(&self.timestamp)?;
        let timestamp = Timestamp::from_bytes(&timestamp_bytes)?;
        Ok(DecodedRecord {
            identity: self.identity.clone(),
            signature: ser::base64_decode(&self.signature)?,
            ciphertext: ser::base64_decode(&self.ciphertext)?,
            timestamp_bytes,
            timestamp,
            public_key: ser::base64_decode(&self.public_key)?,
        })
    }

    /// Verify this record.
    ///
    /// `Ok(true)` means the signature covers every field under the embedded
    /// public key and the record isn't from the future. `Ok(false)` means the
    /// record is well-formed but the signature doesn't check out. `Err` means
    /// we couldn't get that far (bad encoding, future timestamp).
    pub fn verify<P: Primitives + ?Sized>(&self, primitives: &P) -> Result<bool> {
        let decoded = self.decode()?;
        Self::verify_decoded(primitives, &decoded)
    }

    pub(crate) fn verify_decoded<P: Primitives + ?Sized>(primitives: &P, decoded: &DecodedRecord) -> Result<bool> {
        let now = primitives.now()?;
        if decoded.timestamp() > &now {
            Err(Error::RecordFutureTimestamp)?;
        }
        let digest = binding_digest(
            primitives,
            decoded.identity().as_bytes(),
            decoded.ciphertext(),
            decoded.timestamp_bytes(),
            decoded.public_key(),
        )?;
        primitives.verify(&digest, decoded.public_key(), decoded.signature())
    }

    /// Decrypt this record's payload using the owner's secret.
    ///
    /// Fails with [`Error::CryptoOpenFailed`] if the secret doesn't derive
    /// this record's public key.
    pub fn open<P: Primitives + ?Sized>(&self, primitives: &P, secret: &[u8]) -> Result<Vec<u8>> {
        let decoded = self.decode()?;
        let keypair: KeyPair = primitives.derive_keypair(secret)?;
        if keypair.public() != decoded.public_key() {
            Err(Error::CryptoOpenFailed)?;
        }
        primitives.decrypt(decoded.ciphertext(), &keypair)
    }
}

/// Verify a record in wire form. See [`Record::verify`].
pub fn verify<P: Primitives + ?Sized>(primitives: &P, record_bytes: &[u8]) -> Result<bool> {
    Record::from_wire(record_bytes)?.verify(primitives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        crypto::StandardPrimitives,
        error::ErrorKind,
        util::test::{self, FailAt, Failing, ShiftedClock},
    };

    fn with_field(record: &Record, field: &str, value: String) -> Record {
        let mut record = record.clone();
        match field {
            "identity" => record.identity = value,
            "signature" => record.signature = value,
            "ciphertext" => record.ciphertext = value,
            "timestamp" => record.timestamp = value,
            "publicKey" => record.public_key = value,
            _ => panic!("unknown field {}", field),
        }
        record
    }

    #[test]
    fn generate_verify() {
        let primitives = test::primitives();
        let cases: [(&str, &[u8], &[u8]); 4] = [
            ("alice", b"p1", b"{\"favorite_color\":\"green\"}"),
            ("bob", b"", b""),
            ("", b"p1", b"x"),
            ("zoë 🦀", b"\x00\xff\x10", &[0u8; 1024]),
        ];
        for (identity, secret, payload) in cases {
            let record = Record::generate(&primitives, identity, secret, payload).unwrap();
            assert_eq!(record.identity(), identity);
            assert_eq!(record.verify(&primitives), Ok(true));
            let bytes = record.to_wire().unwrap();
            assert_eq!(verify(&primitives, &bytes), Ok(true));
        }
    }

    #[test]
    fn generate_is_deterministic_in_key_only() {
        let primitives = test::primitives();
        let record1 = Record::generate(&primitives, "alice", b"p1", b"hi").unwrap();
        let record2 = Record::generate(&primitives, "alice", b"p1", b"hi").unwrap();
        let record3 = Record::generate(&primitives, "alice", b"p2", b"hi").unwrap();
        assert_eq!(record1.public_key(), record2.public_key());
        assert!(record1.public_key() != record3.public_key());
        // fresh nonce every time
        assert!(record1.ciphertext() != record2.ciphertext());
    }

    #[test]
    fn wire_format() {
        let primitives = test::primitives();
        let record = Record::generate(&primitives, "alice", b"p1", b"hi").unwrap();
        let value: serde_json::Value = serde_json::from_slice(&record.to_wire().unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
        keys.sort();
        assert_eq!(keys, vec!["ciphertext", "identity", "publicKey", "signature", "timestamp"]);
        assert_eq!(obj["identity"], "alice");

        // unknown fields are ignored
        let mut extended = value.clone();
        extended["newPublicKey"] = serde_json::Value::String("whatever".into());
        let bytes = serde_json::to_vec(&extended).unwrap();
        assert_eq!(Record::from_wire(&bytes).unwrap(), record);
        assert_eq!(verify(&primitives, &bytes), Ok(true));

        // missing fields are not
        for field in ["identity", "signature", "ciphertext", "timestamp", "publicKey"] {
            let mut missing = value.clone();
            missing.as_object_mut().unwrap().remove(field);
            let bytes = serde_json::to_vec(&missing).unwrap();
            let res = verify(&primitives, &bytes);
            assert_eq!(res.unwrap_err().kind(), ErrorKind::Decode, "missing {}", field);
        }

        assert_eq!(verify(&primitives, b"not json").unwrap_err().kind(), ErrorKind::Decode);
        assert_eq!(verify(&primitives, b"[1, 2, 3]").unwrap_err().kind(), ErrorKind::Decode);
    }

    #[test]
    fn tamper_binary_fields() {
        let primitives = test::primitives();
        let record = Record::generate(&primitives, "alice", b"p1", b"the eagle has landed").unwrap();
        let decoded = record.decode().unwrap();
        let fields: [(&str, &Vec<u8>); 4] = [
            ("signature", decoded.signature()),
            ("ciphertext", decoded.ciphertext()),
            ("timestamp", decoded.timestamp_bytes()),
            ("publicKey", decoded.public_key()),
        ];
        for (name, bytes) in fields {
            for idx in 0..bytes.len() {
                for flip in [0x01u8, 0x80, 0xff] {
                    let mut tampered = bytes.clone();
                    tampered[idx] ^= flip;
                    let record2 = with_field(&record, name, ser::base64_encode(&tampered));
                    let res = record2.verify(&primitives);
                    assert!(res != Ok(true), "{} byte {} flip {:x} still verifies", name, idx, flip);
                }
            }
        }
    }

    #[test]
    fn tamper_identity() {
        let primitives = test::primitives();
        let record = Record::generate(&primitives, "alice", b"p1", b"the eagle has landed").unwrap();
        for idx in 0..record.identity().len() {
            let mut bytes = record.identity().clone().into_bytes();
            bytes[idx] ^= 0x01;
            let identity = String::from_utf8(bytes).unwrap();
            let record2 = with_field(&record, "identity", identity);
            assert_eq!(record2.verify(&primitives), Ok(false));
        }
        let record2 = with_field(&record, "identity", "alice ".into());
        assert_eq!(record2.verify(&primitives), Ok(false));
        let record2 = with_field(&record, "identity", "alic".into());
        assert_eq!(record2.verify(&primitives), Ok(false));
    }

    #[test]
    fn tamper_text_encoding() {
        let primitives = test::primitives();
        let record = Record::generate(&primitives, "alice", b"p1", b"the eagle has landed").unwrap();
        for field in ["signature", "ciphertext", "timestamp", "publicKey"] {
            let record2 = with_field(&record, field, "!!not base64!!".into());
            assert_eq!(record2.verify(&primitives).unwrap_err().kind(), ErrorKind::Decode);
        }
        // a timestamp of the wrong size is a decode error too
        let record2 = with_field(&record, "timestamp", ser::base64_encode([1, 2, 3]));
        assert_eq!(record2.verify(&primitives), Err(Error::BadLength));
    }

    #[test]
    fn fields_cannot_shift() {
        // moving bytes between adjacent fields must not keep the digest
        let primitives = test::primitives();
        let digest1 = binding_digest(&primitives, b"alic", b"e-and-bob", b"ts", b"pk").unwrap();
        let digest2 = binding_digest(&primitives, b"alice", b"-and-bob", b"ts", b"pk").unwrap();
        assert!(digest1 != digest2);
        assert_eq!(digest2, binding_digest(&primitives, b"alice", b"-and-bob", b"ts", b"pk").unwrap());
    }

    #[test]
    fn future_timestamp_rejected() {
        let primitives = test::primitives();
        let future = ShiftedClock::new(test::primitives(), chrono::Duration::hours(1));
        let record = Record::generate(&future, "alice", b"p1", b"hi").unwrap();
        assert_eq!(record.verify(&primitives), Err(Error::RecordFutureTimestamp));
        assert_eq!(record.verify(&primitives).unwrap_err().kind(), ErrorKind::StaleOrFutureTimestamp);
        // once "now" catches up, it's fine
        let later = ShiftedClock::new(test::primitives(), chrono::Duration::hours(2));
        assert_eq!(record.verify(&later), Ok(true));

        // old records do not expire
        let past = ShiftedClock::new(test::primitives(), -chrono::Duration::days(3650));
        let record = Record::generate(&past, "alice", b"p1", b"hi").unwrap();
        assert_eq!(record.verify(&primitives), Ok(true));
    }

    #[test]
    fn primitive_failures_propagate() {
        for (fail_at, expected) in [
            (FailAt::Derive, Error::CryptoKDFFailed),
            (FailAt::Encrypt, Error::CryptoSealFailed),
            (FailAt::Clock, Error::CryptoBadKey),
            (FailAt::Hash, Error::CryptoBadKey),
            (FailAt::Sign, Error::CryptoSignatureFailed),
        ] {
            let failing = Failing::new(test::primitives(), fail_at);
            let res = Record::generate(&failing, "alice", b"p1", b"hi");
            assert_eq!(res, Err(expected));
        }

        let primitives = test::primitives();
        let record = Record::generate(&primitives, "alice", b"p1", b"hi").unwrap();
        let failing = Failing::new(test::primitives(), FailAt::Verify);
        assert_eq!(record.verify(&failing), Err(Error::CryptoBadKey));
    }

    #[test]
    fn open_payload() {
        let primitives = test::primitives();
        let record = Record::generate(&primitives, "alice", b"p1", b"my diary").unwrap();
        assert_eq!(record.open(&primitives, b"p1").unwrap(), b"my diary");
        assert_eq!(record.open(&primitives, b"p2"), Err(Error::CryptoOpenFailed));

        // another instance with the same config can open it too
        let other = StandardPrimitives::default();
        assert_eq!(record.open(&other, b"p1").unwrap(), b"my diary");

        let mut ciphertext = record.decode().unwrap().ciphertext().clone();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 1;
        let record2 = with_field(&record, "ciphertext", ser::base64_encode(&ciphertext));
        assert_eq!(record2.open(&primitives, b"p1"), Err(Error::CryptoOpenFailed));
    }
}
