use crate::{Certificate, CertificatePersistence, IdentityAssurance, StorageAddress, StoreError};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// The certificates known to one owner, indexed by subject and by issuer.
///
/// Two caches sit over the persistence backend: the owner index
/// (subject → certificates about it) and per-subject identity assurance
/// results. Both are built lazily and dropped together on every `store` or
/// `remove`. Every method that may fill a cache takes `&mut self`; callers
/// sharing a store across threads wrap it in their own lock.
///
/// Owner and signer identifiers match exactly: `"Alice"` and `"alice"` are
/// different peers.
///
/// # Example
/// ```
/// use icn_pki::{Certificate, CertificateStore, InMemoryCertificatePersistence, KeyAlgorithm, KeyPair};
///
/// let owner = KeyPair::generate(KeyAlgorithm::Ed25519);
/// let alice = KeyPair::generate(KeyAlgorithm::Ed25519);
/// let mut store = CertificateStore::new("owner", "Owner", InMemoryCertificatePersistence::new());
///
/// let cert = Certificate::produce(
///     "owner", "Owner", owner.private_key(),
///     "alice", "Alice", alice.public.clone(),
///     0, "Ed25519",
/// ).unwrap();
/// store.store(&cert).unwrap();
///
/// assert_eq!(store.certificates_by_owner("alice").unwrap().len(), 1);
/// assert_eq!(store.certificates_by_signer("owner").unwrap().len(), 1);
/// ```
pub struct CertificateStore<P> {
    owner_id: String,
    owner_name: String,
    persistence: P,
    by_owner: Option<HashMap<String, HashSet<Certificate>>>,
    pub(crate) assurance: Option<HashMap<String, IdentityAssurance>>,
}

impl<P: CertificatePersistence> CertificateStore<P> {
    pub fn new(owner_id: impl Into<String>, owner_name: impl Into<String>, persistence: P) -> Self {
        Self {
            owner_id: owner_id.into(),
            owner_name: owner_name.into(),
            persistence,
            by_owner: None,
            assurance: None,
        }
    }

    /// The local trust anchor's identifier.
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    fn owner_index(&mut self) -> Result<&HashMap<String, HashSet<Certificate>>, StoreError> {
        let index = match self.by_owner.take() {
            Some(index) => index,
            None => {
                let certificates = self.persistence.read_all()?;
                let count = certificates.len();
                let mut index: HashMap<String, HashSet<Certificate>> = HashMap::new();
                for certificate in certificates {
                    index
                        .entry(certificate.owner_id().to_string())
                        .or_default()
                        .insert(certificate);
                }
                debug!(certificates = count, subjects = index.len(), "rebuilt owner index");
                index
            }
        };
        Ok(self.by_owner.insert(index))
    }

    /// All certificates whose owner is `subject_id`; empty if there are none.
    pub fn certificates_by_owner(
        &mut self,
        subject_id: &str,
    ) -> Result<HashSet<Certificate>, StoreError> {
        Ok(self
            .owner_index()?
            .get(subject_id)
            .cloned()
            .unwrap_or_default())
    }

    /// All certificates issued by `issuer_id`. Builds the owner index on demand.
    pub fn certificates_by_signer(
        &mut self,
        issuer_id: &str,
    ) -> Result<HashSet<Certificate>, StoreError> {
        Ok(self
            .owner_index()?
            .values()
            .flatten()
            .filter(|certificate| certificate.signer_id() == issuer_id)
            .cloned()
            .collect())
    }

    /// Every known certificate, in no particular order.
    pub fn all_certificates(&mut self) -> Result<Vec<Certificate>, StoreError> {
        Ok(self.owner_index()?.values().flatten().cloned().collect())
    }

    /// Persist `certificate`, invalidating both caches.
    pub fn store(&mut self, certificate: &Certificate) -> Result<StorageAddress, StoreError> {
        self.invalidate_caches();
        let address = self.persistence.append(certificate)?;
        info!(
            owner = %certificate.owner_id(),
            signer = %certificate.signer_id(),
            address = %address,
            "stored certificate"
        );
        Ok(address)
    }

    /// Remove `certificate`, invalidating both caches.
    ///
    /// Fails with [`StoreError::NotFound`] if the store does not hold it.
    pub fn remove(&mut self, certificate: &Certificate) -> Result<(), StoreError> {
        let known = self
            .owner_index()?
            .get(certificate.owner_id())
            .is_some_and(|certificates| certificates.contains(certificate));
        if !known {
            return Err(StoreError::NotFound {
                owner_id: certificate.owner_id().to_string(),
                signer_id: certificate.signer_id().to_string(),
            });
        }

        self.invalidate_caches();
        self.persistence.delete(certificate)?;
        info!(
            owner = %certificate.owner_id(),
            signer = %certificate.signer_id(),
            "removed certificate"
        );
        Ok(())
    }

    /// Advisory only: expired certificates are never dropped automatically.
    pub fn is_expired(&self, certificate: &Certificate) -> bool {
        certificate.is_expired()
    }

    /// Drop the owner index and every cached assurance result.
    pub fn invalidate_caches(&mut self) {
        self.by_owner = None;
        self.assurance = None;
    }
}
