//! Identity assurance: how sure the owner can be that a subject's
//! certified key really belongs to that subject.
//!
//! Every certificate is an edge from its owner back to its signer. Starting
//! at the queried subject, the search walks these edges depth-first toward
//! the local owner. Each hop through an issuer multiplies in the chance that
//! the issuer got the key exchange right, `1 - rate(issuer) / 10`. The most
//! probable chain that ends in a certificate the owner's key verifies wins.

use crate::{
    Certificate, CertificatePersistence, CertificateStore, PeerDirectory, StoreError,
    MAX_EXCHANGE_FAILURE_RATE,
};
use icn_crypto::PublicKey;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// No information about a subject.
pub const LOWEST_IDENTITY_ASSURANCE_LEVEL: u8 = 0;

/// Subject certified directly by the owner.
pub const HIGHEST_IDENTITY_ASSURANCE_LEVEL: u8 = 10;

const ROUNDING_TOLERANCE: f64 = 1e-9;

/// A trust level together with the certification path that produced it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IdentityAssurance {
    level: u8,
    probability: f64,
    path: Vec<String>,
}

impl IdentityAssurance {
    /// Level 0, empty path.
    pub fn none() -> Self {
        Self {
            level: LOWEST_IDENTITY_ASSURANCE_LEVEL,
            probability: 0.0,
            path: Vec::new(),
        }
    }

    fn direct(owner_id: &str) -> Self {
        Self {
            level: HIGHEST_IDENTITY_ASSURANCE_LEVEL,
            probability: 1.0,
            path: vec![owner_id.to_string()],
        }
    }

    /// Scale a probability in [0, 1] to a level, rounding half up.
    ///
    /// Chain probabilities are products of tenths, so a scaled value that
    /// should sit exactly on a half can land a few ulps below it.
    fn from_probability(probability: f64, path: Vec<String>) -> Self {
        let probability = probability.clamp(0.0, 1.0);
        let level = (probability * 10.0 + 0.5 + ROUNDING_TOLERANCE).floor() as u8;
        Self {
            level: level.min(HIGHEST_IDENTITY_ASSURANCE_LEVEL),
            probability,
            path,
        }
    }

    /// Trust level from 0 (none) to 10 (maximum).
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Probability that every hop in the path attributed the right key.
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Issuers from the subject's signer up to and including the owner.
    pub fn path(&self) -> &[String] {
        &self.path
    }
}

fn by_signer(certificates: HashSet<Certificate>) -> Vec<Certificate> {
    let mut certificates: Vec<_> = certificates.into_iter().collect();
    certificates.sort_by(|a, b| {
        a.signer_id()
            .cmp(b.signer_id())
            .then(a.valid_since().cmp(&b.valid_since()))
    });
    certificates
}

fn better(best: IdentityAssurance, candidate: IdentityAssurance) -> IdentityAssurance {
    if candidate.probability > best.probability {
        candidate
    } else {
        best
    }
}

impl<P: CertificatePersistence> CertificateStore<P> {
    /// The owner's assurance that `subject_id` holds its certified key.
    ///
    /// Results are cached per subject until the store next changes. The
    /// cache does not key on `directory`: after changing failure rates or
    /// switching directories, call [`CertificateStore::invalidate_caches`]
    /// or earlier levels are returned unchanged. Fails
    /// with [`StoreError::TrustChainIntegrity`] when a certificate claims the
    /// owner as signer but the owner's current key does not verify it.
    pub fn assurance_of<D: PeerDirectory + ?Sized>(
        &mut self,
        subject_id: &str,
        directory: &D,
    ) -> Result<IdentityAssurance, StoreError> {
        if let Some(cached) = self
            .assurance
            .as_ref()
            .and_then(|cache| cache.get(subject_id))
        {
            return Ok(cached.clone());
        }

        let assurance = self.compute_assurance(subject_id, directory)?;
        debug!(
            subject = %subject_id,
            level = assurance.level,
            path = ?assurance.path,
            "computed identity assurance"
        );
        self.assurance
            .get_or_insert_with(Default::default)
            .insert(subject_id.to_string(), assurance.clone());
        Ok(assurance)
    }

    /// Shorthand for `assurance_of(..).level()`.
    pub fn assurance_level<D: PeerDirectory + ?Sized>(
        &mut self,
        subject_id: &str,
        directory: &D,
    ) -> Result<u8, StoreError> {
        Ok(self.assurance_of(subject_id, directory)?.level())
    }

    /// Shorthand for `assurance_of(..).path()`.
    pub fn certification_path<D: PeerDirectory + ?Sized>(
        &mut self,
        subject_id: &str,
        directory: &D,
    ) -> Result<Vec<String>, StoreError> {
        Ok(self.assurance_of(subject_id, directory)?.path)
    }

    fn compute_assurance<D: PeerDirectory + ?Sized>(
        &mut self,
        subject_id: &str,
        directory: &D,
    ) -> Result<IdentityAssurance, StoreError> {
        let certificates = by_signer(self.certificates_by_owner(subject_id)?);
        if certificates.is_empty() {
            return Ok(IdentityAssurance::none());
        }

        let owner_id = self.owner_id().to_string();
        let owner_key = directory.current_owner_public_key();

        let mut owner_signed = false;
        for certificate in certificates.iter().filter(|c| c.signer_id() == owner_id) {
            owner_signed = true;
            match certificate.verify_checked(&owner_key) {
                Ok(true) => return Ok(IdentityAssurance::direct(&owner_id)),
                Ok(false) => {
                    warn!(subject = %subject_id, "owner-signed certificate does not verify");
                }
                Err(e) => {
                    warn!(
                        subject = %subject_id,
                        error = %e,
                        "owner-signed certificate is unusable, removing it"
                    );
                    self.remove(certificate)?;
                }
            }
        }
        if owner_signed {
            return Err(StoreError::TrustChainIntegrity {
                subject: subject_id.to_string(),
                owner_id,
            });
        }

        let mut best = IdentityAssurance::none();
        for certificate in &certificates {
            let candidate = self.walk(
                Vec::new(),
                subject_id,
                certificate,
                None,
                &owner_key,
                directory,
            )?;
            best = better(best, candidate);
        }
        Ok(best)
    }

    /// One step of the backward chain search.
    ///
    /// `certificate` is the edge being followed; `subject` is the identifier
    /// it is examined for (its owner on the first step, its signer after).
    /// `visited` holds the identifiers already on this branch and is cloned
    /// per candidate so sibling branches stay independent. Every dead end,
    /// cycle or failed verification resolves to [`IdentityAssurance::none`].
    fn walk<D: PeerDirectory + ?Sized>(
        &mut self,
        mut visited: Vec<String>,
        subject: &str,
        certificate: &Certificate,
        accumulated: Option<f64>,
        owner_key: &PublicKey,
        directory: &D,
    ) -> Result<IdentityAssurance, StoreError> {
        if subject == self.owner_id() {
            if !certificate.verify(owner_key) {
                return Ok(IdentityAssurance::none());
            }
            // visited[0] is the queried subject, the rest are issuers.
            let mut path: Vec<String> = visited.into_iter().skip(1).collect();
            path.push(self.owner_id().to_string());
            return Ok(IdentityAssurance::from_probability(
                accumulated.unwrap_or(1.0),
                path,
            ));
        }

        if visited.iter().any(|id| id == subject) {
            debug!(subject = %subject, "cycle in certificate chain");
            return Ok(IdentityAssurance::none());
        }
        visited.push(subject.to_string());

        let issuer = certificate.signer_id();
        if issuer != subject {
            if visited.iter().any(|id| id == issuer) {
                debug!(issuer = %issuer, "cycle in certificate chain");
                return Ok(IdentityAssurance::none());
            }
            visited.push(issuer.to_string());
        }

        let upstream = by_signer(self.certificates_by_owner(issuer)?);
        if upstream.is_empty() {
            return Ok(IdentityAssurance::none());
        }

        let rate = directory
            .exchange_failure_rate(issuer)
            .min(MAX_EXCHANGE_FAILURE_RATE);
        let failure_probability = f64::from(rate) / 10.0;
        let probability = accumulated.unwrap_or(1.0) * (1.0 - failure_probability);

        let mut best = IdentityAssurance::none();
        for candidate in &upstream {
            // The issuer's certified key must have produced the current edge.
            if !certificate.verify(candidate.public_key()) {
                continue;
            }
            let outcome = self.walk(
                visited.clone(),
                candidate.signer_id(),
                candidate,
                Some(probability),
                owner_key,
                directory,
            )?;
            best = better(best, outcome);
        }
        Ok(best)
    }
}
