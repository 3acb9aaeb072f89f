//! ICN PKI – decentralized public-key certification for ICN peers.
//!
//! - `Certificate`: a signed statement binding an owner identifier to a public key.
//! - `CertificateStore`: owner/signer-indexed certificate set over pluggable persistence.
//! - Identity assurance: trust levels (0–10) derived by walking certificate chains
//!   back to the local owner, weighted by each issuer's key-exchange failure rate.
//! - Zero `unsafe`; `#![forbid(unsafe_code)]`.

#![forbid(unsafe_code)]

mod assurance;
mod certificate;
mod error;
mod peer_directory;
mod persistence;
mod storage_address;
mod store;
mod wire;

pub use assurance::{
    IdentityAssurance, HIGHEST_IDENTITY_ASSURANCE_LEVEL, LOWEST_IDENTITY_ASSURANCE_LEVEL,
};
pub use certificate::{Certificate, DEFAULT_CERTIFICATE_VALIDITY_MONTHS};
pub use error::{CertificateError, PersistenceError, StoreError};
pub use peer_directory::{
    InMemoryPeerDirectory, PeerDirectory, DEFAULT_EXCHANGE_FAILURE_RATE,
    MAX_EXCHANGE_FAILURE_RATE,
};
pub use persistence::{CertificatePersistence, InMemoryCertificatePersistence};
pub use storage_address::StorageAddress;
pub use store::CertificateStore;

pub use icn_crypto::{KeyAlgorithm, KeyPair, PrivateKey, PublicKey, SigningAlgorithm};
