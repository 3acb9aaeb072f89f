use crate::{Certificate, PersistenceError, StorageAddress};

/// Storage capability behind a [`crate::CertificateStore`].
///
/// Implementations own the physical format (files, embedded database, ...).
/// The store only ever enumerates, appends and deletes.
pub trait CertificatePersistence {
    /// Every stored certificate, each carrying its storage address.
    fn read_all(&self) -> Result<Vec<Certificate>, PersistenceError>;

    /// Persist one certificate and return where it went.
    fn append(&mut self, certificate: &Certificate) -> Result<StorageAddress, PersistenceError>;

    /// Remove one certificate. Removing an absent certificate is not an error.
    fn delete(&mut self, certificate: &Certificate) -> Result<(), PersistenceError>;
}

/// Volatile persistence keeping certificates in insertion order.
///
/// Each append gets the next era, starting at 0.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCertificatePersistence {
    entries: Vec<Certificate>,
    next_era: i32,
}

impl InMemoryCertificatePersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CertificatePersistence for InMemoryCertificatePersistence {
    fn read_all(&self) -> Result<Vec<Certificate>, PersistenceError> {
        Ok(self.entries.clone())
    }

    fn append(&mut self, certificate: &Certificate) -> Result<StorageAddress, PersistenceError> {
        let address = StorageAddress::for_era(self.next_era);
        self.next_era = self
            .next_era
            .checked_add(1)
            .ok_or_else(|| PersistenceError::Backend("era counter exhausted".to_string()))?;
        self.entries
            .push(certificate.clone().with_storage_address(address.clone()));
        Ok(address)
    }

    fn delete(&mut self, certificate: &Certificate) -> Result<(), PersistenceError> {
        self.entries.retain(|stored| stored != certificate);
        Ok(())
    }
}
