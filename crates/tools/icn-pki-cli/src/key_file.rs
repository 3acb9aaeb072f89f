use anyhow::{anyhow, bail, Context, Result};
use icn_crypto::{KeyAlgorithm, KeyPair, PrivateKey, PublicKey};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// On-disk JSON form of a key. Files handed to other peers may omit
/// `secret_key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyFile {
    pub algorithm: KeyAlgorithm,
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    pub generated_at: String,
}

impl KeyFile {
    pub fn from_keypair(keypair: &KeyPair) -> Self {
        Self {
            algorithm: keypair.algorithm(),
            public_key: keypair.public.to_hex(),
            secret_key: Some(hex::encode(keypair.private_key().to_bytes())),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// The same key without its secret half.
    pub fn public_only(&self) -> Self {
        Self {
            secret_key: None,
            ..self.clone()
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read key file '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse key file '{}'", path.display()))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write key file '{}'", path.display()))
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        let bytes = hex::decode(&self.public_key).context("Public key is not valid hex")?;
        Ok(PublicKey::from_encoded(self.algorithm.tag(), &bytes)?)
    }

    /// Rebuild the full keypair, checking the stored public key matches.
    pub fn keypair(&self) -> Result<KeyPair> {
        let secret = self
            .secret_key
            .as_deref()
            .ok_or_else(|| anyhow!("Key file has no secret key"))?;
        let bytes = hex::decode(secret).context("Secret key is not valid hex")?;
        let keypair = KeyPair::from_private(PrivateKey::from_bytes(self.algorithm, &bytes)?);
        if keypair.public != self.public_key()? {
            bail!("Public key does not match the secret key");
        }
        Ok(keypair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_survives_a_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.json");
        let keypair = KeyPair::generate(KeyAlgorithm::Secp256k1);

        KeyFile::from_keypair(&keypair).write(&path).unwrap();
        let restored = KeyFile::read(&path).unwrap().keypair().unwrap();
        assert_eq!(restored.public, keypair.public);
    }

    #[test]
    fn public_only_file_has_no_keypair() {
        let keypair = KeyPair::generate(KeyAlgorithm::Ed25519);
        let file = KeyFile::from_keypair(&keypair).public_only();

        assert_eq!(file.public_key().unwrap(), keypair.public);
        assert!(file.keypair().is_err());
        assert!(!serde_json::to_string(&file).unwrap().contains("secret_key"));
    }

    #[test]
    fn mismatched_halves_are_rejected() {
        let a = KeyPair::generate(KeyAlgorithm::Ed25519);
        let b = KeyPair::generate(KeyAlgorithm::Ed25519);
        let mut file = KeyFile::from_keypair(&a);
        file.public_key = b.public.to_hex();
        assert!(file.keypair().is_err());
    }
}
