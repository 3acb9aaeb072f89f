use icn_crypto::{CryptoError, KeyDecodingError};
use thiserror::Error;

/// Errors produced while building, encoding or decoding certificates and
/// storage addresses.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CertificateError {
    #[error("malformed encoding at field `{field}`: {reason}")]
    Malformed { field: &'static str, reason: String },

    #[error("public key could not be decoded: {0}")]
    KeyDecoding(#[from] KeyDecodingError),

    #[error("signing failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error("field `{field}` is {len} bytes long, the encoding allows at most {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("timestamp {0} ms is outside the representable validity range")]
    InvalidTimestamp(i64),
}

/// Errors surfaced by a concrete persistence backend.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("stored certificate at {location} is corrupt: {source}")]
    Corrupt {
        location: String,
        #[source]
        source: CertificateError,
    },
}

/// Errors from certificate store operations and identity assurance queries.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no stored certificate for owner {owner_id} signed by {signer_id}")]
    NotFound { owner_id: String, signer_id: String },

    #[error("certificate for {subject} is attributed to owner {owner_id} but cannot be verified")]
    TrustChainIntegrity { subject: String, owner_id: String },

    #[error("exchange failure rate {rate} for {peer_id} is outside 0..=10")]
    InvalidFailureRate { peer_id: String, rate: u8 },

    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("certificate error: {0}")]
    Certificate(#[from] CertificateError),
}
