use assert_matches::assert_matches;
use icn_crypto::{KeyAlgorithm, KeyPair};
use icn_pki::{
    Certificate, CertificatePersistence, CertificateStore, InMemoryPeerDirectory,
    PersistenceError, StoreError,
};
use icn_pki_cli::SledCertificatePersistence;
use sled::Db;
use std::path::Path;
use tempfile::tempdir;

fn certify(
    signer_id: &str,
    signer: &KeyPair,
    owner_id: &str,
    owner: &KeyPair,
) -> Certificate {
    Certificate::produce(
        signer_id,
        signer_id,
        signer.private_key(),
        owner_id,
        owner_id,
        owner.public.clone(),
        chrono::Utc::now().timestamp_millis(),
        "Ed25519",
    )
    .unwrap()
}

/// A fresh store over `db`, sharing nothing with earlier stores but the
/// database itself.
fn open(db: &Db, path: &Path) -> CertificateStore<SledCertificatePersistence> {
    CertificateStore::new(
        "alice",
        "Alice",
        SledCertificatePersistence::from_db(db.clone(), path).unwrap(),
    )
}

#[test]
fn certificates_are_read_back_with_addresses() {
    let dir = tempdir().unwrap();
    let db = sled::open(dir.path()).unwrap();
    let alice = KeyPair::generate(KeyAlgorithm::Ed25519);
    let bob = KeyPair::generate(KeyAlgorithm::Ed25519);
    let certificate = certify("alice", &alice, "bob", &bob);

    let address = {
        let mut store = open(&db, dir.path());
        store.store(&certificate).unwrap()
    };
    assert_eq!(address.format(), "sled");
    assert!(address.location().starts_with("sled://"));
    assert_eq!(address.era(), 0);

    let mut store = open(&db, dir.path());
    let stored = store.certificates_by_owner("bob").unwrap();
    assert_eq!(stored.len(), 1);
    let stored = stored.into_iter().next().unwrap();
    assert_eq!(stored, certificate);
    assert_eq!(stored.storage_address(), Some(&address));
    assert!(stored.verify(&alice.public));
}

#[test]
fn eras_keep_counting_across_sessions() {
    let dir = tempdir().unwrap();
    let alice = KeyPair::generate(KeyAlgorithm::Ed25519);

    let mut addresses = Vec::new();
    for _ in 0..5 {
        let subject = KeyPair::generate(KeyAlgorithm::Ed25519);
        let mut persistence = SledCertificatePersistence::open(dir.path()).unwrap();
        addresses.push(
            persistence
                .append(&certify("alice", &alice, "bob", &subject))
                .unwrap(),
        );
    }

    let eras: Vec<i32> = addresses.iter().map(|a| a.era()).collect();
    assert_eq!(eras, vec![0, 1, 2, 3, 4]);
    // sled ids jump on every reopen; the era does not follow them
    assert!(addresses[4].location() != addresses[3].location());

    let persistence = SledCertificatePersistence::open(dir.path()).unwrap();
    let mut stored: Vec<i32> = persistence
        .read_all()
        .unwrap()
        .iter()
        .filter_map(|c| c.storage_address().map(|a| a.era()))
        .collect();
    stored.sort_unstable();
    assert_eq!(stored, eras);
}

#[test]
fn removal_reaches_the_database() {
    let dir = tempdir().unwrap();
    let db = sled::open(dir.path()).unwrap();
    let alice = KeyPair::generate(KeyAlgorithm::Ed25519);
    let bob = KeyPair::generate(KeyAlgorithm::Ed25519);
    let carol = KeyPair::generate(KeyAlgorithm::Ed25519);
    let for_bob = certify("alice", &alice, "bob", &bob);
    let for_carol = certify("alice", &alice, "carol", &carol);

    {
        let mut store = open(&db, dir.path());
        store.store(&for_bob).unwrap();
        store.store(&for_carol).unwrap();
        store.remove(&for_bob).unwrap();
        assert_matches!(store.remove(&for_bob), Err(StoreError::NotFound { .. }));
    }

    let mut store = open(&db, dir.path());
    assert!(store.certificates_by_owner("bob").unwrap().is_empty());
    assert_eq!(store.certificates_by_signer("alice").unwrap().len(), 1);
}

#[test]
fn assurance_over_sled_storage() {
    let dir = tempdir().unwrap();
    let db = sled::open(dir.path()).unwrap();
    let alice = KeyPair::generate(KeyAlgorithm::Ed25519);
    let bob = KeyPair::generate(KeyAlgorithm::Ed25519);
    let dave = KeyPair::generate(KeyAlgorithm::Ed25519);

    let mut directory = InMemoryPeerDirectory::new(alice.public.clone());
    directory.set_exchange_failure_rate("bob", 2).unwrap();

    let mut store = open(&db, dir.path());
    store.store(&certify("alice", &alice, "bob", &bob)).unwrap();
    store.store(&certify("bob", &bob, "dave", &dave)).unwrap();

    let assurance = store.assurance_of("dave", &directory).unwrap();
    assert_eq!(assurance.level(), 8);
    assert_eq!(assurance.path(), &["bob".to_string(), "alice".to_string()]);
}

#[test]
fn corrupt_entries_are_reported() {
    let dir = tempdir().unwrap();
    let db = sled::open(dir.path()).unwrap();
    db.open_tree("certificates")
        .unwrap()
        .insert(7u64.to_be_bytes(), &b"\0\0\0\0not a certificate"[..])
        .unwrap();

    let persistence = SledCertificatePersistence::from_db(db, dir.path()).unwrap();
    assert_matches!(
        persistence.read_all(),
        Err(PersistenceError::Corrupt { location, .. }) if location.ends_with("#7")
    );
}
