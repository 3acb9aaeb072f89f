use thiserror::Error;

/// Errors raised while decoding public or private key material.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KeyDecodingError {
    #[error("unsupported key algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid {algorithm} key length: expected {expected} bytes, found {found} bytes")]
    InvalidLength {
        algorithm: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid {algorithm} key material: {reason}")]
    InvalidKeyMaterial {
        algorithm: &'static str,
        reason: String,
    },

    #[error("hex decoding failed: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Errors raised by signing, or by verification when the inputs themselves
/// are unusable (as opposed to a signature that simply does not match).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CryptoError {
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("{key_algorithm} key cannot be used with signing algorithm {signing_algorithm}")]
    IncompatibleKey {
        signing_algorithm: String,
        key_algorithm: &'static str,
    },

    #[error("key decoding failed: {0}")]
    KeyDecoding(#[from] KeyDecodingError),
}
