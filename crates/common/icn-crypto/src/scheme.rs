use crate::{CryptoError, KeyAlgorithm, PrivateKey, PublicKey};
use ed25519_dalek::{Signer as _, Verifier as _};
use std::fmt;
use std::str::FromStr;

/// Signature schemes a certificate may name in its `signing_algorithm` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    /// Ed25519 over the raw payload.
    Ed25519,
    /// ECDSA over secp256k1 with SHA-256, DER-encoded signatures.
    EcdsaSecp256k1Sha256,
}

impl SigningAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            SigningAlgorithm::Ed25519 => "Ed25519",
            SigningAlgorithm::EcdsaSecp256k1Sha256 => "SHA256withECDSA",
        }
    }

    /// The only key family this scheme accepts.
    pub fn key_algorithm(&self) -> KeyAlgorithm {
        match self {
            SigningAlgorithm::Ed25519 => KeyAlgorithm::Ed25519,
            SigningAlgorithm::EcdsaSecp256k1Sha256 => KeyAlgorithm::Secp256k1,
        }
    }

    /// The default scheme for keys of the given family.
    pub fn default_for(key_algorithm: KeyAlgorithm) -> Self {
        match key_algorithm {
            KeyAlgorithm::Ed25519 => SigningAlgorithm::Ed25519,
            KeyAlgorithm::Secp256k1 => SigningAlgorithm::EcdsaSecp256k1Sha256,
        }
    }

    fn ensure_compatible(&self, key_algorithm: KeyAlgorithm) -> Result<(), CryptoError> {
        if self.key_algorithm() == key_algorithm {
            Ok(())
        } else {
            Err(CryptoError::IncompatibleKey {
                signing_algorithm: self.name().to_string(),
                key_algorithm: key_algorithm.tag(),
            })
        }
    }
}

impl FromStr for SigningAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ed25519" => Ok(SigningAlgorithm::Ed25519),
            "SHA256withECDSA" => Ok(SigningAlgorithm::EcdsaSecp256k1Sha256),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sign `payload` with `key` under the named scheme.
pub fn sign(
    algorithm_name: &str,
    key: &PrivateKey,
    payload: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let algorithm = SigningAlgorithm::from_str(algorithm_name)?;
    algorithm.ensure_compatible(key.algorithm())?;

    let signature = match key {
        PrivateKey::Ed25519(sk) => sk.sign(payload).to_bytes().to_vec(),
        PrivateKey::Secp256k1(sk) => {
            let sig: k256::ecdsa::Signature = sk.sign(payload);
            sig.to_der().as_bytes().to_vec()
        }
    };
    Ok(signature)
}

/// Check `signature` over `payload` against `key` under the named scheme.
///
/// Returns `Err` only when the inputs cannot be used at all: an unknown
/// scheme, or a key from the wrong family. Signature bytes that fail to
/// parse or do not match yield `Ok(false)`.
pub fn verify(
    algorithm_name: &str,
    key: &PublicKey,
    payload: &[u8],
    signature: &[u8],
) -> Result<bool, CryptoError> {
    let algorithm = SigningAlgorithm::from_str(algorithm_name)?;
    algorithm.ensure_compatible(key.algorithm())?;

    match algorithm {
        SigningAlgorithm::Ed25519 => {
            let vk = key.to_ed25519()?;
            let Ok(sig) = ed25519_dalek::Signature::from_slice(signature) else {
                tracing::debug!(len = signature.len(), "malformed Ed25519 signature");
                return Ok(false);
            };
            Ok(vk.verify(payload, &sig).is_ok())
        }
        SigningAlgorithm::EcdsaSecp256k1Sha256 => {
            let vk = key.to_secp256k1()?;
            let Ok(sig) = k256::ecdsa::Signature::from_der(signature) else {
                tracing::debug!(len = signature.len(), "malformed ECDSA signature");
                return Ok(false);
            };
            Ok(vk.verify(payload, &sig).is_ok())
        }
    }
}
