//! Support code for the `icn-pki` operator tool: configuration, key files
//! and the sled-backed certificate persistence.

pub mod config;
pub mod key_file;
pub mod sled_persistence;

pub use config::PkiConfig;
pub use key_file::KeyFile;
pub use sled_persistence::SledCertificatePersistence;
