use crate::wire::{check_text, WireReader, WireWriter};
use crate::{CertificateError, StorageAddress};
use chrono::{DateTime, Months, Utc};
use icn_crypto::{CryptoError, PrivateKey, PublicKey};
use std::hash::{Hash, Hasher};
use tracing::{debug, warn};

/// Validity window applied by [`Certificate::produce`].
pub const DEFAULT_CERTIFICATE_VALIDITY_MONTHS: u32 = 12;

/// A signed statement by `signer_id` that `owner_id` holds `public_key`.
///
/// Certificates are immutable: they are created by [`Certificate::produce`]
/// or decoded with [`Certificate::from_bytes`]. The signature covers every
/// field except the signature itself and the storage address, in this order:
///
/// ```text
/// signer_id, signer_name, owner_id, owner_name,
/// valid_since (i64 ms), valid_until (i64 ms), signing_algorithm,
/// public key (algorithm tag, u32-prefixed key bytes)
/// ```
///
/// The persisted form appends a u32-prefixed signature. Texts are
/// u16-prefixed UTF-8; all integers are big-endian.
///
/// Equality and hashing cover the signed fields and the signature, never the
/// storage address.
#[derive(Clone, Debug)]
pub struct Certificate {
    signer_id: String,
    signer_name: String,
    owner_id: String,
    owner_name: String,
    public_key: PublicKey,
    valid_since: i64,
    valid_until: i64,
    signing_algorithm: String,
    signature: Vec<u8>,
    storage_address: Option<StorageAddress>,
}

impl Certificate {
    /// Issue a certificate: `signer` attests that `owner` holds
    /// `owner_public_key`, signing with `signer_key` under `signing_algorithm`.
    ///
    /// A `valid_since` in the future is clamped to now. The certificate is
    /// valid for [`DEFAULT_CERTIFICATE_VALIDITY_MONTHS`] from then.
    #[allow(clippy::too_many_arguments)]
    pub fn produce(
        signer_id: impl Into<String>,
        signer_name: impl Into<String>,
        signer_key: &PrivateKey,
        owner_id: impl Into<String>,
        owner_name: impl Into<String>,
        owner_public_key: PublicKey,
        valid_since: i64,
        signing_algorithm: &str,
    ) -> Result<Self, CertificateError> {
        let now = Utc::now().timestamp_millis();
        let valid_since = if valid_since > now {
            debug!(valid_since, now, "valid_since lies in the future, clamping to now");
            now
        } else {
            valid_since
        };
        let valid_until = DateTime::<Utc>::from_timestamp_millis(valid_since)
            .and_then(|since| since.checked_add_months(Months::new(DEFAULT_CERTIFICATE_VALIDITY_MONTHS)))
            .map(|until| until.timestamp_millis())
            .ok_or(CertificateError::InvalidTimestamp(valid_since))?;

        let mut certificate = Self {
            signer_id: signer_id.into(),
            signer_name: signer_name.into(),
            owner_id: owner_id.into(),
            owner_name: owner_name.into(),
            public_key: owner_public_key,
            valid_since,
            valid_until,
            signing_algorithm: signing_algorithm.to_string(),
            signature: Vec::new(),
            storage_address: None,
        };
        certificate.check_field_lengths()?;

        certificate.signature =
            icn_crypto::sign(signing_algorithm, signer_key, &certificate.signed_payload())?;
        debug!(
            signer = %certificate.signer_id,
            owner = %certificate.owner_id,
            algorithm = %certificate.signing_algorithm,
            "produced certificate"
        );
        Ok(certificate)
    }

    fn check_field_lengths(&self) -> Result<(), CertificateError> {
        check_text("signer_id", &self.signer_id)?;
        check_text("signer_name", &self.signer_name)?;
        check_text("owner_id", &self.owner_id)?;
        check_text("owner_name", &self.owner_name)?;
        check_text("signing_algorithm", &self.signing_algorithm)?;
        Ok(())
    }

    /// Verify the signature against the issuer's public key.
    ///
    /// Never fails: any cryptographic problem, including an unknown scheme or
    /// a key of the wrong family, counts as "does not verify".
    pub fn verify(&self, issuer_public_key: &PublicKey) -> bool {
        match self.verify_checked(issuer_public_key) {
            Ok(valid) => valid,
            Err(e) => {
                warn!(
                    signer = %self.signer_id,
                    owner = %self.owner_id,
                    error = %e,
                    "certificate cannot be verified"
                );
                false
            }
        }
    }

    /// Like [`Certificate::verify`], but reports unusable inputs (unknown
    /// scheme, incompatible key) as `Err` instead of folding them into `false`.
    pub fn verify_checked(&self, issuer_public_key: &PublicKey) -> Result<bool, CryptoError> {
        icn_crypto::verify(
            &self.signing_algorithm,
            issuer_public_key,
            &self.signed_payload(),
            &self.signature,
        )
    }

    /// The exact bytes covered by the signature.
    pub fn signed_payload(&self) -> Vec<u8> {
        let mut w = WireWriter::new();
        self.write_signed_fields(&mut w);
        w.into_bytes()
    }

    fn write_signed_fields(&self, w: &mut WireWriter) {
        w.put_text(&self.signer_id);
        w.put_text(&self.signer_name);
        w.put_text(&self.owner_id);
        w.put_text(&self.owner_name);
        w.put_i64(self.valid_since);
        w.put_i64(self.valid_until);
        w.put_text(&self.signing_algorithm);
        w.put_text(self.public_key.algorithm().tag());
        w.put_bytes(self.public_key.encoded());
    }

    /// Persisted form: the signed payload followed by the signature.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = WireWriter::new();
        self.write_signed_fields(&mut w);
        w.put_bytes(&self.signature);
        w.into_bytes()
    }

    /// Decode the persisted form. The result carries no storage address.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CertificateError> {
        let mut r = WireReader::new(bytes);
        let signer_id = r.text("signer_id")?;
        let signer_name = r.text("signer_name")?;
        let owner_id = r.text("owner_id")?;
        let owner_name = r.text("owner_name")?;
        let valid_since = r.i64("valid_since")?;
        let valid_until = r.i64("valid_until")?;
        let signing_algorithm = r.text("signing_algorithm")?;
        let key_algorithm = r.text("public_key_algorithm")?;
        let key_bytes = r.bytes("public_key")?;
        let signature = r.bytes("signature")?;
        r.finish()?;

        if valid_since > valid_until {
            return Err(CertificateError::Malformed {
                field: "valid_until",
                reason: format!("valid_until {} precedes valid_since {}", valid_until, valid_since),
            });
        }
        let public_key = PublicKey::from_encoded(&key_algorithm, &key_bytes)?;

        Ok(Self {
            signer_id,
            signer_name,
            owner_id,
            owner_name,
            public_key,
            valid_since,
            valid_until,
            signing_algorithm,
            signature,
            storage_address: None,
        })
    }

    /// Attach the address a persistence backend stored this certificate at.
    pub fn with_storage_address(mut self, address: StorageAddress) -> Self {
        self.storage_address = Some(address);
        self
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp_millis())
    }

    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        now_millis > self.valid_until
    }

    pub fn signer_id(&self) -> &str {
        &self.signer_id
    }

    pub fn signer_name(&self) -> &str {
        &self.signer_name
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    /// The owner's certified key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn valid_since(&self) -> i64 {
        self.valid_since
    }

    pub fn valid_until(&self) -> i64 {
        self.valid_until
    }

    pub fn signing_algorithm(&self) -> &str {
        &self.signing_algorithm
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn storage_address(&self) -> Option<&StorageAddress> {
        self.storage_address.as_ref()
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.signer_id == other.signer_id
            && self.signer_name == other.signer_name
            && self.owner_id == other.owner_id
            && self.owner_name == other.owner_name
            && self.public_key == other.public_key
            && self.valid_since == other.valid_since
            && self.valid_until == other.valid_until
            && self.signing_algorithm == other.signing_algorithm
            && self.signature == other.signature
    }
}

impl Eq for Certificate {}

impl Hash for Certificate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.signer_id.hash(state);
        self.signer_name.hash(state);
        self.owner_id.hash(state);
        self.owner_name.hash(state);
        self.public_key.hash(state);
        self.valid_since.hash(state);
        self.valid_until.hash(state);
        self.signing_algorithm.hash(state);
        self.signature.hash(state);
    }
}
