use icn_pki::{
    Certificate, CertificateError, CertificatePersistence, PersistenceError, StorageAddress,
};
use sled::{Db, IVec, Tree};
use std::path::{Path, PathBuf};

const CERTIFICATE_TREE: &str = "certificates";
const META_TREE: &str = "certificate_meta";
const NEXT_ERA_KEY: &str = "next_era";
const ADDRESS_FORMAT: &str = "sled";
const ERA_LEN: usize = 4;

fn backend(e: sled::Error) -> PersistenceError {
    PersistenceError::Backend(e.to_string())
}

fn decode_era(bytes: &[u8]) -> Option<i32> {
    let bytes: [u8; ERA_LEN] = bytes.try_into().ok()?;
    Some(i32::from_be_bytes(bytes))
}

/// Certificate persistence backed by a sled database.
///
/// Each certificate is stored under a big-endian id from `Db::generate_id`
/// as its era (big-endian i32) followed by its persisted byte form. Eras
/// come from a counter kept in the database, so they keep counting up
/// across sessions. The storage address is `sled://<path>#<id>`.
pub struct SledCertificatePersistence {
    path: PathBuf,
    db: Db,
    tree: Tree,
    meta: Tree,
}

impl SledCertificatePersistence {
    /// Opens or creates a sled database at the specified path.
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        tracing::info!("Opening sled certificate database at: {:?}", path);
        let db = sled::open(path).map_err(backend)?;
        Self::from_db(db, path)
    }

    /// Use an already open database; `path` only feeds storage addresses.
    pub fn from_db(db: Db, path: &Path) -> Result<Self, PersistenceError> {
        let tree = db.open_tree(CERTIFICATE_TREE).map_err(backend)?;
        let meta = db.open_tree(META_TREE).map_err(backend)?;
        Ok(Self {
            path: path.to_path_buf(),
            db,
            tree,
            meta,
        })
    }

    fn location(&self, id: u64) -> String {
        format!("sled://{}#{}", self.path.display(), id)
    }

    fn address(&self, id: u64, era: i32) -> Result<StorageAddress, PersistenceError> {
        StorageAddress::new(ADDRESS_FORMAT, self.location(id), era).map_err(|source| {
            PersistenceError::Corrupt {
                location: self.location(id),
                source,
            }
        })
    }

    fn decode_id(&self, key: &[u8]) -> Result<u64, PersistenceError> {
        let bytes: [u8; 8] = key.try_into().map_err(|_| {
            PersistenceError::Backend(format!("unexpected key of {} bytes", key.len()))
        })?;
        Ok(u64::from_be_bytes(bytes))
    }

    /// Take the next era from the persisted counter.
    fn next_era(&self) -> Result<i32, PersistenceError> {
        // A counter that is unreadable or exhausted is left untouched.
        let previous: Option<IVec> = self
            .meta
            .fetch_and_update(NEXT_ERA_KEY, |current| match current {
                None => Some(1i32.to_be_bytes().to_vec()),
                Some(bytes) => match decode_era(bytes) {
                    Some(era) if era < i32::MAX => Some((era + 1).to_be_bytes().to_vec()),
                    _ => Some(bytes.to_vec()),
                },
            })
            .map_err(backend)?;

        match previous {
            None => Ok(0),
            Some(bytes) => match decode_era(&bytes) {
                Some(era) if era < i32::MAX => Ok(era),
                Some(_) => Err(PersistenceError::Backend(
                    "era counter exhausted".to_string(),
                )),
                None => Err(PersistenceError::Backend(format!(
                    "era counter holds {} bytes",
                    bytes.len()
                ))),
            },
        }
    }
}

impl CertificatePersistence for SledCertificatePersistence {
    fn read_all(&self) -> Result<Vec<Certificate>, PersistenceError> {
        let mut certificates = Vec::new();
        for entry in self.tree.iter() {
            let (key, value) = entry.map_err(backend)?;
            let id = self.decode_id(&key)?;
            let corrupt = |source| PersistenceError::Corrupt {
                location: self.location(id),
                source,
            };

            if value.len() < ERA_LEN {
                return Err(corrupt(CertificateError::Malformed {
                    field: "era",
                    reason: "truncated".to_string(),
                }));
            }
            let (era, encoded) = value.split_at(ERA_LEN);
            let era = decode_era(era).unwrap_or_default();
            let certificate = Certificate::from_bytes(encoded).map_err(corrupt)?;
            certificates.push(certificate.with_storage_address(self.address(id, era)?));
        }
        tracing::debug!(count = certificates.len(), "loaded certificates from sled");
        Ok(certificates)
    }

    fn append(&mut self, certificate: &Certificate) -> Result<StorageAddress, PersistenceError> {
        let era = self.next_era()?;
        let id = self.db.generate_id().map_err(backend)?;
        let address = self.address(id, era)?;

        let mut value = era.to_be_bytes().to_vec();
        value.extend_from_slice(&certificate.to_bytes());
        self.tree.insert(id.to_be_bytes(), value).map_err(backend)?;
        self.db.flush().map_err(backend)?;
        tracing::debug!(address = %address, "appended certificate");
        Ok(address)
    }

    fn delete(&mut self, certificate: &Certificate) -> Result<(), PersistenceError> {
        let encoded = certificate.to_bytes();
        let mut removed = 0usize;
        for entry in self.tree.iter() {
            let (key, value) = entry.map_err(backend)?;
            if value.get(ERA_LEN..) == Some(encoded.as_slice()) {
                self.tree.remove(key).map_err(backend)?;
                removed += 1;
            }
        }
        self.tree.flush().map_err(backend)?;
        tracing::debug!(removed, "deleted certificate");
        Ok(())
    }
}
