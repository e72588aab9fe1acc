use crate::{
    config::{Config, KdfConfig},
    crypto::{
        base::{self, Hash, Sealed, SecretKey, SignKeypair, SignKeypairPublic, SignKeypairSignature},
        KeyPair, Primitives,
    },
    error::{Error, Result},
    util::{ser::BinarySecret, Timestamp},
};
use parking_lot::Mutex;
use rand_chacha::ChaCha20Rng;

/// HKDF info used to turn a signing seed into the payload encryption key.
const PAYLOAD_KEY_INFO: &[u8] = b"stamp-record/payload-key";

/// The primitives we ship: blake3 (or argon2id) derivation, ed25519 signing,
/// blake3 hashing, and xchacha20poly1305 payload encryption under a key
/// stretched from the signing seed.
///
/// Payload nonces come from an internal ChaCha20 CSPRNG, so encrypting the
/// same payload twice produces different ciphertexts.
#[derive(Debug)]
pub struct StandardPrimitives {
    kdf: KdfConfig,
    rng: Mutex<ChaCha20Rng>,
}

impl StandardPrimitives {
    /// Create a new set of primitives from our config.
    pub fn new(config: &Config) -> Self {
        Self::with_rng(config, base::rng_chacha20())
    }

    /// Create a new set of primitives with a specific RNG.
    pub fn with_rng(config: &Config, rng: ChaCha20Rng) -> Self {
        Self {
            kdf: config.kdf().clone(),
            rng: Mutex::new(rng),
        }
    }

    fn derive_seed(&self, secret: &[u8]) -> Result<BinarySecret<32>> {
        match &self.kdf {
            KdfConfig::Blake3 => Ok(base::derive_seed_blake3(secret)),
            KdfConfig::Argon2id { ops, mem, salt } => base::derive_secret_key(secret, salt.as_bytes(), *ops, *mem),
        }
    }

    fn sign_keypair(keypair: &KeyPair) -> Result<SignKeypair> {
        let seed = BinarySecret::<32>::try_from(keypair.secret().as_slice()).map_err(|_| Error::CryptoBadKey)?;
        let sign_keypair = SignKeypair::new_ed25519_from_seed(&seed);
        if sign_keypair.public().as_ref() != keypair.public().as_slice() {
            Err(Error::CryptoBadKey)?;
        }
        Ok(sign_keypair)
    }

    fn payload_key(keypair: &KeyPair) -> Result<SecretKey> {
        let mut key_bytes = [0u8; 32];
        base::stretch_key(keypair.secret().as_slice(), &mut key_bytes, Some(PAYLOAD_KEY_INFO), None)?;
        SecretKey::new_xchacha20poly1305_from_bytes(key_bytes)
    }
}

impl Default for StandardPrimitives {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Primitives for StandardPrimitives {
    fn derive_keypair(&self, secret: &[u8]) -> Result<KeyPair> {
        let seed = self.derive_seed(secret)?;
        let sign_keypair = SignKeypair::new_ed25519_from_seed(&seed);
        Ok(KeyPair::new(sign_keypair.public().as_ref().to_vec(), seed.expose_secret().to_vec()))
    }

    fn encrypt(&self, plaintext: &[u8], keypair: &KeyPair) -> Result<Vec<u8>> {
        let key = Self::payload_key(keypair)?;
        let sealed = {
            let mut rng = self.rng.lock();
            key.seal(&mut *rng, plaintext)?
        };
        Ok(sealed.to_bytes())
    }

    fn decrypt(&self, ciphertext: &[u8], keypair: &KeyPair) -> Result<Vec<u8>> {
        let key = Self::payload_key(keypair)?;
        let sealed = Sealed::xchacha20poly1305_from_bytes(ciphertext).map_err(|_| Error::CryptoOpenFailed)?;
        key.open(&sealed)
    }

    fn hash(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(Hash::new_blake3(data)?.as_bytes().to_vec())
    }

    fn sign(&self, digest: &[u8], keypair: &KeyPair) -> Result<Vec<u8>> {
        let sig = Self::sign_keypair(keypair)?.sign(digest);
        Ok(sig.as_ref().to_vec())
    }

    fn verify(&self, digest: &[u8], public_key: &[u8], signature: &[u8]) -> Result<bool> {
        let public = match SignKeypairPublic::ed25519_from_bytes(public_key) {
            Ok(public) => public,
            Err(_) => return Ok(false),
        };
        let sig = match SignKeypairSignature::ed25519_from_bytes(signature) {
            Ok(sig) => sig,
            Err(_) => return Ok(false),
        };
        Ok(public.verify(&sig, digest))
    }

    fn now(&self) -> Result<Timestamp> {
        Ok(Timestamp::now())
    }
}
