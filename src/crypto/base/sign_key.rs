use crate::{
    error::Result,
    util::ser::{Binary, BinarySecret},
};
use std::ops::Deref;

/// A signature derived from a signing keypair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignKeypairSignature {
    Ed25519(Binary<64>),
}

impl SignKeypairSignature {
    /// Read an ed25519 signature from raw bytes.
    pub fn ed25519_from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::Ed25519(Binary::try_from(bytes)?))
    }
}

impl AsRef<[u8]> for SignKeypairSignature {
    fn as_ref(&self) -> &[u8] {
        match self {
            Self::Ed25519(sig) => sig.as_ref(),
        }
    }
}

/// An asymmetric signing keypair.
///
/// Unlike a keypair that lives in a keychain, the secret half here is never
/// stored anywhere: it is rebuilt from the owner's secret whenever it's needed
/// and wiped when dropped.
#[derive(Debug, Clone)]
pub enum SignKeypair {
    /// Ed25519 signing keypair
    Ed25519 { public: Binary<32>, secret: BinarySecret<32> },
}

impl SignKeypair {
    /// Create an ed25519 keypair from a cryptographic seed. The same seed
    /// always produces the same keypair.
    pub fn new_ed25519_from_seed(seed: &BinarySecret<32>) -> Self {
        let secret = ed25519_consensus::SigningKey::from(*seed.expose_secret());
        let public = secret.verification_key();
        Self::Ed25519 {
            public: Binary::new(public.to_bytes()),
            secret: BinarySecret::new(secret.to_bytes()),
        }
    }

    /// Sign a value.
    pub fn sign(&self, data: &[u8]) -> SignKeypairSignature {
        match self {
            Self::Ed25519 { secret, .. } => {
                let seckey = ed25519_consensus::SigningKey::from(*secret.expose_secret());
                SignKeypairSignature::Ed25519(Binary::new(seckey.sign(data).to_bytes()))
            }
        }
    }

    /// Grab the public half of this keypair.
    pub fn public(&self) -> SignKeypairPublic {
        match self {
            Self::Ed25519 { public, .. } => SignKeypairPublic::Ed25519(public.clone()),
        }
    }
}

/// An asymmetric signing public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignKeypairPublic {
    /// Ed25519 signing public key
    Ed25519(Binary<32>),
}

impl SignKeypairPublic {
    /// Read an ed25519 public key from raw bytes.
    pub fn ed25519_from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::Ed25519(Binary::try_from(bytes)?))
    }

    /// Verify a value with a detached signature given the public key of the
    /// signer. Keys that are not valid curve points simply fail to verify.
    pub fn verify(&self, signature: &SignKeypairSignature, data: &[u8]) -> bool {
        match (self, signature) {
            (Self::Ed25519(pubkey_bytes), SignKeypairSignature::Ed25519(sig_bytes)) => {
                let pubkey = match ed25519_consensus::VerificationKey::try_from(*pubkey_bytes.deref()) {
                    Ok(pk) => pk,
                    Err(_) => return false,
                };
                let sig = ed25519_consensus::Signature::from(*sig_bytes.deref());
                pubkey.verify(&sig, data).is_ok()
            }
        }
    }
}

impl AsRef<[u8]> for SignKeypairPublic {
    fn as_ref(&self) -> &[u8] {
        match self {
            Self::Ed25519(pubkey) => pubkey.as_ref(),
        }
    }
}
