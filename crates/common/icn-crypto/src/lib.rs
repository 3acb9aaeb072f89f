//! ICN Crypto – key material and signature schemes for ICN certificates.
//!
//! - `Ed25519` signatures over raw payloads (`ed25519-dalek`).
//! - `SHA256withECDSA` signatures over secp256k1 (`k256`), DER-encoded.
//! - A tagged public-key codec: algorithm name plus encoded key bytes.
//! - Zero `unsafe`; `#![forbid(unsafe_code)]`.

#![forbid(unsafe_code)]

mod error;
mod keys;
mod scheme;

pub use error::{CryptoError, KeyDecodingError};
pub use keys::{KeyAlgorithm, KeyPair, PrivateKey, PublicKey};
pub use scheme::{sign, verify, SigningAlgorithm};
