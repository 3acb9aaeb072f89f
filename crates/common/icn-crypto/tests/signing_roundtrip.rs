use assert_matches::assert_matches;
use icn_crypto::{sign, verify, CryptoError, KeyAlgorithm, KeyPair, SigningAlgorithm};

#[test]
fn test_sign_verify_roundtrip_all_schemes() {
    let payload = b"test payload for certificate signing";

    for algorithm in [SigningAlgorithm::Ed25519, SigningAlgorithm::EcdsaSecp256k1Sha256] {
        let kp = KeyPair::generate(algorithm.key_algorithm());

        let signature = sign(algorithm.name(), kp.private_key(), payload)
            .expect("Failed to sign payload");
        assert_matches!(verify(algorithm.name(), &kp.public, payload, &signature), Ok(true));

        // Tamper with the payload
        let tampered_payload = b"tampered payload";
        assert_matches!(
            verify(algorithm.name(), &kp.public, tampered_payload, &signature),
            Ok(false)
        );

        // Tamper with the signature
        let mut tampered_sig = signature.clone();
        let last = tampered_sig.len() - 1;
        tampered_sig[last] ^= 0x01;
        assert_matches!(
            verify(algorithm.name(), &kp.public, payload, &tampered_sig),
            Ok(false)
        );

        // Someone else's key
        let other = KeyPair::generate(algorithm.key_algorithm());
        assert_matches!(verify(algorithm.name(), &other.public, payload, &signature), Ok(false));
    }
}

#[test]
fn test_unknown_scheme_is_an_error() {
    let kp = KeyPair::generate(KeyAlgorithm::Ed25519);
    assert_matches!(
        sign("SHA256withRSA", kp.private_key(), b"payload"),
        Err(CryptoError::UnsupportedAlgorithm(name)) if name == "SHA256withRSA"
    );
    assert_matches!(
        verify("SHA256withRSA", &kp.public, b"payload", &[0u8; 64]),
        Err(CryptoError::UnsupportedAlgorithm(_))
    );
}

#[test]
fn test_key_family_mismatch_is_an_error() {
    let ed = KeyPair::generate(KeyAlgorithm::Ed25519);
    let ec = KeyPair::generate(KeyAlgorithm::Secp256k1);

    assert_matches!(
        sign("SHA256withECDSA", ed.private_key(), b"payload"),
        Err(CryptoError::IncompatibleKey { key_algorithm: "Ed25519", .. })
    );
    assert_matches!(
        verify("Ed25519", &ec.public, b"payload", &[0u8; 64]),
        Err(CryptoError::IncompatibleKey { .. })
    );
}

#[test]
fn test_malformed_signature_bytes_do_not_verify() {
    let kp = KeyPair::generate(KeyAlgorithm::Secp256k1);
    assert_matches!(verify("SHA256withECDSA", &kp.public, b"payload", &[1, 2, 3]), Ok(false));

    let kp = KeyPair::generate(KeyAlgorithm::Ed25519);
    assert_matches!(verify("Ed25519", &kp.public, b"payload", &[]), Ok(false));
}
