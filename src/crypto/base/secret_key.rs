use crate::{
    error::{Error, Result},
    util::ser::{Binary, BinarySecret},
};
use chacha20poly1305::aead::{Aead, KeyInit};
use rand::{CryptoRng, RngCore};
use std::ops::Deref;

/// A self-describing, encrypted object that can be opened with the right key.
#[derive(Debug, Clone, PartialEq, Eq, getset::Getters)]
#[getset(get = "pub")]
pub struct Sealed {
    /// Our heroic nonce
    nonce: SecretKeyNonce,
    /// The ciphertext
    ciphertext: Vec<u8>,
}

impl Sealed {
    fn new(nonce: SecretKeyNonce, ciphertext: Vec<u8>) -> Self {
        Self { nonce, ciphertext }
    }

    /// Flatten into `nonce | ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let nonce_bytes: &[u8] = match self.nonce() {
            SecretKeyNonce::XChaCha20Poly1305(bin) => bin.as_ref(),
        };
        let mut out = Vec::with_capacity(nonce_bytes.len() + self.ciphertext.len());
        out.extend_from_slice(nonce_bytes);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Read a sealed xchacha20poly1305 object created via [`Sealed::to_bytes`].
    pub fn xchacha20poly1305_from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 24 {
            Err(Error::BadLength)?;
        }
        let (nonce, ciphertext) = bytes.split_at(24);
        Ok(Self::new(SecretKeyNonce::XChaCha20Poly1305(Binary::try_from(nonce)?), ciphertext.to_vec()))
    }
}

/// A symmetric encryption key nonce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretKeyNonce {
    XChaCha20Poly1305(Binary<24>),
}

/// A symmetric encryption key
#[derive(Debug, Clone)]
pub enum SecretKey {
    XChaCha20Poly1305(BinarySecret<32>),
}

impl SecretKey {
    /// Try to create a SecretKey from a byte slice
    pub fn new_xchacha20poly1305_from_bytes(secret_bytes: [u8; 32]) -> Result<Self> {
        Ok(Self::XChaCha20Poly1305(BinarySecret::new(secret_bytes)))
    }

    /// Create a nonce for use with this secret key
    pub fn gen_nonce<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<SecretKeyNonce> {
        match self {
            SecretKey::XChaCha20Poly1305(_) => {
                let mut randbuf = [0u8; 24];
                rng.fill_bytes(&mut randbuf);
                Ok(SecretKeyNonce::XChaCha20Poly1305(Binary::new(randbuf)))
            }
        }
    }

    /// Encrypt a value with a secret key and a fresh random nonce
    pub fn seal<R: RngCore + CryptoRng>(&self, rng: &mut R, data: &[u8]) -> Result<Sealed> {
        let nonce = self.gen_nonce(rng)?;
        self.seal_with_nonce(nonce, data)
    }

    /// Encrypt a value with a secret key/nonce
    pub fn seal_with_nonce(&self, nonce: SecretKeyNonce, data: &[u8]) -> Result<Sealed> {
        match (self, &nonce) {
            (SecretKey::XChaCha20Poly1305(ref key), SecretKeyNonce::XChaCha20Poly1305(ref nonce_bin)) => {
                let cipher = chacha20poly1305::XChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(key.expose_secret().as_slice()));
                let enc = cipher
                    .encrypt(chacha20poly1305::XNonce::from_slice(nonce_bin.deref().as_slice()), data)
                    .map_err(|_| Error::CryptoSealFailed)?;
                Ok(Sealed::new(nonce, enc))
            }
        }
    }

    /// Decrypt a value with a secret key/nonce
    pub fn open(&self, sealed: &Sealed) -> Result<Vec<u8>> {
        match (self, sealed.nonce()) {
            (SecretKey::XChaCha20Poly1305(ref key), SecretKeyNonce::XChaCha20Poly1305(ref nonce)) => {
                let cipher = chacha20poly1305::XChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(key.expose_secret().as_slice()));
                let dec = cipher
                    .decrypt(chacha20poly1305::XNonce::from_slice(nonce.deref().as_slice()), sealed.ciphertext().as_slice())
                    .map_err(|_| Error::CryptoOpenFailed)?;
                Ok(dec)
            }
        }
    }
}
