use anyhow::{Context, Result};
use icn_crypto::{KeyAlgorithm, PublicKey, SigningAlgorithm};
use icn_pki::{InMemoryPeerDirectory, DEFAULT_EXCHANGE_FAILURE_RATE};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for the certificate tool.
#[derive(Debug, Deserialize, Clone)]
pub struct PkiConfig {
    /// Identifier of the local owner, the trust anchor.
    pub owner_id: String,

    /// Display name written into certificates the owner issues.
    pub owner_name: String,

    /// Key file holding the owner's signing key.
    pub key_path: PathBuf,

    /// Directory of the sled database holding certificates.
    pub storage_path: PathBuf,

    /// Failure rate assumed for peers without an entry in `failure_rates`.
    pub default_failure_rate: Option<u8>,

    /// Optional log level string (e.g., "info", "debug", "icn_pki=trace").
    pub log_level: Option<String>,

    /// Per-peer key exchange failure rates, 0..=10.
    #[serde(default)]
    pub failure_rates: HashMap<String, u8>,

    /// Scheme for issued certificates. Derived from the owner key if unset.
    pub signing_algorithm: Option<String>,
}

impl PkiConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {:?}", path))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse configuration file: {:?}", path))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Peer directory anchored at `owner_key` with the configured rates.
    pub fn peer_directory(&self, owner_key: PublicKey) -> Result<InMemoryPeerDirectory> {
        let mut directory = InMemoryPeerDirectory::new(owner_key).with_default_rate(
            self.default_failure_rate
                .unwrap_or(DEFAULT_EXCHANGE_FAILURE_RATE),
        )?;
        for (peer, rate) in &self.failure_rates {
            directory.set_exchange_failure_rate(peer.as_str(), *rate)?;
        }
        Ok(directory)
    }

    /// The scheme used when the owner signs with a key of `key_algorithm`.
    pub fn signing_algorithm(&self, key_algorithm: KeyAlgorithm) -> Result<SigningAlgorithm> {
        match &self.signing_algorithm {
            Some(name) => Ok(name
                .parse::<SigningAlgorithm>()
                .with_context(|| format!("Invalid signing_algorithm in configuration: {}", name))?),
            None => Ok(SigningAlgorithm::default_for(key_algorithm)),
        }
    }
}
