//! Knobs for the standard primitives and the store.
//!
//! Everything here has a default, and everything is serde-friendly so a
//! surrounding application can embed it in whatever config file it already
//! has.

use crate::crypto::base::{KDF_MEM_INTERACTIVE, KDF_MEM_MODERATE, KDF_MEM_SENSITIVE, KDF_OPS_INTERACTIVE, KDF_OPS_MODERATE, KDF_OPS_SENSITIVE};
use serde_derive::{Deserialize, Serialize};

/// How many times a write re-reads and retries after losing a
/// compare-and-swap before giving up.
pub const DEFAULT_MAX_SWAP_ATTEMPTS: u32 = 16;

/// How a secret becomes a signing keypair.
///
/// Every writer and reader of a given identity must use the same settings:
/// different settings derive different keys, and the store will (correctly)
/// treat them as a different owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum KdfConfig {
    /// A single keyed blake3 pass. Fast, and weak against offline guessing of
    /// low-entropy secrets.
    Blake3,
    /// Argon2id with a fixed application salt (at least 16 bytes).
    Argon2id {
        /// CPU difficulty
        ops: u32,
        /// Memory difficulty, in KiB
        mem: u32,
        /// The application-wide salt
        salt: String,
    },
}

impl KdfConfig {
    /// Argon2id tuned for interactive use.
    pub fn argon2id_interactive<S: Into<String>>(salt: S) -> Self {
        Self::Argon2id {
            ops: KDF_OPS_INTERACTIVE,
            mem: KDF_MEM_INTERACTIVE,
            salt: salt.into(),
        }
    }

    /// Argon2id with moderate difficulty.
    pub fn argon2id_moderate<S: Into<String>>(salt: S) -> Self {
        Self::Argon2id {
            ops: KDF_OPS_MODERATE,
            mem: KDF_MEM_MODERATE,
            salt: salt.into(),
        }
    }

    /// Argon2id for when you really, really mean it.
    pub fn argon2id_sensitive<S: Into<String>>(salt: S) -> Self {
        Self::Argon2id {
            ops: KDF_OPS_SENSITIVE,
            mem: KDF_MEM_SENSITIVE,
            salt: salt.into(),
        }
    }
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self::Blake3
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, getset::Getters, getset::CopyGetters, getset::Setters)]
#[serde(default)]
pub struct Config {
    /// Secret to keypair derivation
    #[getset(get = "pub", set = "pub")]
    kdf: KdfConfig,
    /// Compare-and-swap retry budget for store writes
    #[getset(get_copy = "pub", set = "pub")]
    max_swap_attempts: u32,
}

impl Config {
    /// Create a new config
    pub fn new(kdf: KdfConfig, max_swap_attempts: u32) -> Self {
        Self { kdf, max_swap_attempts }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(KdfConfig::default(), DEFAULT_MAX_SWAP_ATTEMPTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = Config::default();
        assert_eq!(config.kdf(), &KdfConfig::Blake3);
        assert_eq!(config.max_swap_attempts(), DEFAULT_MAX_SWAP_ATTEMPTS);

        let parsed: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn config_deserialize() {
        let parsed: Config = serde_json::from_str(
            r#"{"kdf": {"algorithm": "argon2id", "ops": 3, "mem": 4096, "salt": "my app salt, at least 16"}, "max_swap_attempts": 4}"#,
        )
        .unwrap();
        assert_eq!(
            parsed.kdf(),
            &KdfConfig::Argon2id {
                ops: 3,
                mem: 4096,
                salt: "my app salt, at least 16".into()
            }
        );
        assert_eq!(parsed.max_swap_attempts(), 4);

        let parsed: Config = serde_json::from_str(r#"{"kdf": {"algorithm": "blake3"}}"#).unwrap();
        assert_eq!(parsed.kdf(), &KdfConfig::Blake3);
        assert_eq!(parsed.max_swap_attempts(), DEFAULT_MAX_SWAP_ATTEMPTS);

        assert!(serde_json::from_str::<Config>(r#"{"kdf": {"algorithm": "md5"}}"#).is_err());
    }

    #[test]
    fn config_presets() {
        match KdfConfig::argon2id_sensitive("salty salty salty") {
            KdfConfig::Argon2id { ops, mem, salt } => {
                assert_eq!(ops, KDF_OPS_SENSITIVE);
                assert_eq!(mem, KDF_MEM_SENSITIVE);
                assert_eq!(salt, "salty salty salty");
            }
            _ => panic!("wrong kdf"),
        }
        let mut config = Config::default();
        config.set_kdf(KdfConfig::argon2id_interactive("salty salty salty"));
        config.set_max_swap_attempts(2);
        assert_eq!(config.max_swap_attempts(), 2);
        assert!(matches!(config.kdf(), KdfConfig::Argon2id { ops: KDF_OPS_INTERACTIVE, .. }));
    }
}
