use crate::KeyDecodingError;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ED25519_KEY_LENGTH: usize = 32;
const SECP256K1_COMPRESSED_KEY_LENGTH: usize = 33;
const SECP256K1_SECRET_LENGTH: usize = 32;

/// Asymmetric key families a certificate can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    #[serde(rename = "Ed25519")]
    Ed25519,
    #[serde(rename = "secp256k1")]
    Secp256k1,
}

impl KeyAlgorithm {
    /// The algorithm tag written in front of encoded key material.
    pub fn tag(&self) -> &'static str {
        match self {
            KeyAlgorithm::Ed25519 => "Ed25519",
            KeyAlgorithm::Secp256k1 => "secp256k1",
        }
    }

    /// Exact inverse of [`KeyAlgorithm::tag`]. Encoded keys must carry the
    /// canonical tag so that re-encoding reproduces the signed bytes.
    pub fn from_tag(tag: &str) -> Result<Self, KeyDecodingError> {
        match tag {
            "Ed25519" => Ok(KeyAlgorithm::Ed25519),
            "secp256k1" => Ok(KeyAlgorithm::Secp256k1),
            other => Err(KeyDecodingError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Case-insensitive, for user input.
impl FromStr for KeyAlgorithm {
    type Err = KeyDecodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ed25519") {
            Ok(KeyAlgorithm::Ed25519)
        } else if s.eq_ignore_ascii_case("secp256k1") {
            Ok(KeyAlgorithm::Secp256k1)
        } else {
            Err(KeyDecodingError::UnsupportedAlgorithm(s.to_string()))
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// An algorithm-tagged public key in its standard encoding.
///
/// Ed25519 keys are the 32 raw key bytes; secp256k1 keys are SEC1
/// compressed points. The encoding is validated on construction, so any
/// `PublicKey` value decodes into a usable verifying key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PublicKey {
    algorithm: KeyAlgorithm,
    encoded: Vec<u8>,
}

impl PublicKey {
    /// Decode a public key from its algorithm tag and encoded bytes.
    pub fn from_encoded(algorithm_tag: &str, encoded: &[u8]) -> Result<Self, KeyDecodingError> {
        let algorithm = KeyAlgorithm::from_tag(algorithm_tag)?;
        let key = Self {
            algorithm,
            encoded: encoded.to_vec(),
        };
        match algorithm {
            KeyAlgorithm::Ed25519 => {
                key.to_ed25519()?;
            }
            KeyAlgorithm::Secp256k1 => {
                key.to_secp256k1()?;
            }
        }
        Ok(key)
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Standard encoding of the key material, without the algorithm tag.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// Hex rendering of the encoded key, used for display and key files.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.encoded)
    }

    pub(crate) fn to_ed25519(&self) -> Result<ed25519_dalek::VerifyingKey, KeyDecodingError> {
        let bytes: [u8; ED25519_KEY_LENGTH] =
            self.encoded
                .as_slice()
                .try_into()
                .map_err(|_| KeyDecodingError::InvalidLength {
                    algorithm: "Ed25519",
                    expected: ED25519_KEY_LENGTH,
                    found: self.encoded.len(),
                })?;
        ed25519_dalek::VerifyingKey::from_bytes(&bytes).map_err(|e| {
            KeyDecodingError::InvalidKeyMaterial {
                algorithm: "Ed25519",
                reason: e.to_string(),
            }
        })
    }

    pub(crate) fn to_secp256k1(&self) -> Result<k256::ecdsa::VerifyingKey, KeyDecodingError> {
        if self.encoded.len() != SECP256K1_COMPRESSED_KEY_LENGTH {
            return Err(KeyDecodingError::InvalidLength {
                algorithm: "secp256k1",
                expected: SECP256K1_COMPRESSED_KEY_LENGTH,
                found: self.encoded.len(),
            });
        }
        k256::ecdsa::VerifyingKey::from_sec1_bytes(&self.encoded).map_err(|e| {
            KeyDecodingError::InvalidKeyMaterial {
                algorithm: "secp256k1",
                reason: e.to_string(),
            }
        })
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

/// A signing key. `Debug` never prints secret material.
#[derive(Clone)]
pub enum PrivateKey {
    Ed25519(ed25519_dalek::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
}

impl PrivateKey {
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PrivateKey::Ed25519(_) => KeyAlgorithm::Ed25519,
            PrivateKey::Secp256k1(_) => KeyAlgorithm::Secp256k1,
        }
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Ed25519(sk) => PublicKey {
                algorithm: KeyAlgorithm::Ed25519,
                encoded: sk.verifying_key().as_bytes().to_vec(),
            },
            PrivateKey::Secp256k1(sk) => PublicKey {
                algorithm: KeyAlgorithm::Secp256k1,
                encoded: sk.verifying_key().to_encoded_point(true).as_bytes().to_vec(),
            },
        }
    }

    /// Raw secret scalar bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            PrivateKey::Ed25519(sk) => sk.to_bytes().to_vec(),
            PrivateKey::Secp256k1(sk) => sk.to_bytes().to_vec(),
        }
    }

    /// Rebuild a signing key from its raw secret bytes.
    pub fn from_bytes(algorithm: KeyAlgorithm, bytes: &[u8]) -> Result<Self, KeyDecodingError> {
        match algorithm {
            KeyAlgorithm::Ed25519 => {
                let secret: [u8; ED25519_KEY_LENGTH] =
                    bytes
                        .try_into()
                        .map_err(|_| KeyDecodingError::InvalidLength {
                            algorithm: "Ed25519",
                            expected: ED25519_KEY_LENGTH,
                            found: bytes.len(),
                        })?;
                Ok(PrivateKey::Ed25519(ed25519_dalek::SigningKey::from_bytes(
                    &secret,
                )))
            }
            KeyAlgorithm::Secp256k1 => {
                if bytes.len() != SECP256K1_SECRET_LENGTH {
                    return Err(KeyDecodingError::InvalidLength {
                        algorithm: "secp256k1",
                        expected: SECP256K1_SECRET_LENGTH,
                        found: bytes.len(),
                    });
                }
                let sk = k256::ecdsa::SigningKey::from_slice(bytes).map_err(|e| {
                    KeyDecodingError::InvalidKeyMaterial {
                        algorithm: "secp256k1",
                        reason: e.to_string(),
                    }
                })?;
                Ok(PrivateKey::Secp256k1(sk))
            }
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

/// A private key together with its derived public key.
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub public: PublicKey,
    private: PrivateKey,
}

impl KeyPair {
    /// Generate a fresh random keypair from the OS RNG.
    pub fn generate(algorithm: KeyAlgorithm) -> Self {
        let private = match algorithm {
            KeyAlgorithm::Ed25519 => {
                PrivateKey::Ed25519(ed25519_dalek::SigningKey::generate(&mut OsRng))
            }
            KeyAlgorithm::Secp256k1 => {
                PrivateKey::Secp256k1(k256::ecdsa::SigningKey::random(&mut OsRng))
            }
        };
        Self::from_private(private)
    }

    pub fn from_private(private: PrivateKey) -> Self {
        Self {
            public: private.public_key(),
            private,
        }
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        self.private.algorithm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn public_key_encoding_round_trips() {
        for algorithm in [KeyAlgorithm::Ed25519, KeyAlgorithm::Secp256k1] {
            let kp = KeyPair::generate(algorithm);
            let decoded =
                PublicKey::from_encoded(kp.public.algorithm().tag(), kp.public.encoded()).unwrap();
            assert_eq!(decoded, kp.public);
        }
    }

    #[test]
    fn private_key_bytes_round_trip() {
        let kp = KeyPair::generate(KeyAlgorithm::Secp256k1);
        let bytes = kp.private_key().to_bytes();
        let restored = PrivateKey::from_bytes(KeyAlgorithm::Secp256k1, &bytes).unwrap();
        assert_eq!(restored.public_key(), kp.public);
    }

    #[test]
    fn unknown_algorithm_tag_rejected() {
        assert_matches!(
            PublicKey::from_encoded("RSA", &[0u8; 32]),
            Err(KeyDecodingError::UnsupportedAlgorithm(tag)) if tag == "RSA"
        );
    }

    #[test]
    fn non_canonical_tag_rejected() {
        let kp = KeyPair::generate(KeyAlgorithm::Ed25519);
        assert!(PublicKey::from_encoded("ed25519", kp.public.encoded()).is_err());
        assert_eq!("ED25519".parse::<KeyAlgorithm>().unwrap(), KeyAlgorithm::Ed25519);
    }

    #[test]
    fn truncated_key_rejected() {
        assert_matches!(
            PublicKey::from_encoded("Ed25519", &[1u8; 31]),
            Err(KeyDecodingError::InvalidLength { expected: 32, found: 31, .. })
        );
        assert_matches!(
            PublicKey::from_encoded("secp256k1", &[0u8; 33]),
            Err(KeyDecodingError::InvalidKeyMaterial { .. })
        );
    }

    #[test]
    fn hex_errors_compare_by_value() {
        let err: KeyDecodingError = hex::FromHexError::OddLength.into();
        assert_eq!(err, KeyDecodingError::Hex(hex::FromHexError::OddLength));
        assert_ne!(err, KeyDecodingError::UnsupportedAlgorithm("x".into()));
    }

    #[test]
    fn debug_hides_secret() {
        let kp = KeyPair::generate(KeyAlgorithm::Ed25519);
        let rendered = format!("{:?}", kp.private_key());
        assert!(!rendered.contains(&hex::encode(kp.private_key().to_bytes())));
    }
}
