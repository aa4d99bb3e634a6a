//! Integration test: offchain attestations.
//!
//! Signs with `OffchainAttestationSigner`, moves the result through JSON,
//! verifies it, and revokes it through the ledger's offchain revocation
//! registry.

use attest_core::{Address, AttestConfig, Uid};
use attest_crypto::Identity;
use attest_integration_tests::{init_tracing, ledger_and_client, test_config, test_domain};
use attest_ledger::RevertReason;
use attest_offchain::{
    OffchainAttestationRequest, OffchainAttestationSigner, OffchainAttestationVerifier,
    OffchainError, SignedOffchainAttestation, VERSION_LEGACY, VERSION_SALTED,
};
use attest_schema::{SchemaEncoder, SchemaItem};

fn is_human_request(recipient: Address) -> OffchainAttestationRequest {
    let encoder = SchemaEncoder::new("bool isHuman").unwrap();
    OffchainAttestationRequest {
        schema: Uid([0x5c; 32]),
        recipient,
        revocable: true,
        data: encoder.encode(&[SchemaItem::bool("isHuman", true)]).unwrap(),
        ..Default::default()
    }
}

// =========================================================================
// Sign → serialize → verify
// =========================================================================

#[test]
fn test_sign_json_verify() {
    init_tracing();
    let attester = Identity::generate();
    let recipient = Identity::generate();
    let signer = OffchainAttestationSigner::from_config(&test_config()).unwrap();
    let verifier = OffchainAttestationVerifier::new();

    let signed = signer
        .sign(&attester, is_human_request(recipient.address()))
        .unwrap();
    let json = signed.to_json().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    for key in [
        "version",
        "schema",
        "recipient",
        "time",
        "expirationTime",
        "revocable",
        "refUID",
        "data",
        "salt",
        "domain",
        "signature",
    ] {
        assert!(value.get(key).is_some(), "missing key {key}");
    }
    assert_eq!(value["version"], VERSION_SALTED);
    assert_eq!(value["domain"]["chainId"], test_domain().chain_id);
    assert!(value["signature"]["r"].as_str().unwrap().starts_with("0x"));

    let restored = SignedOffchainAttestation::from_json(&json).unwrap();
    assert_eq!(restored, signed);
    assert_eq!(restored.uid(), signed.uid());
    assert!(verifier.verify(&attester.address(), &restored).unwrap());
    assert!(!verifier.verify(&recipient.address(), &restored).unwrap());
    assert!(verifier
        .verify_with_domain(&attester.address(), &restored, &test_domain())
        .unwrap());
}

#[test]
fn test_legacy_json_has_no_salt() {
    init_tracing();
    let attester = Identity::generate();
    let signer = OffchainAttestationSigner::new(test_domain())
        .with_version(VERSION_LEGACY)
        .unwrap();
    let signed = signer
        .sign(&attester, is_human_request(Address::ZERO))
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&signed.to_json().unwrap()).unwrap();
    assert!(value.get("salt").is_none());
    assert_eq!(value["version"], VERSION_LEGACY);

    let restored = SignedOffchainAttestation::from_json(&signed.to_json().unwrap()).unwrap();
    assert!(OffchainAttestationVerifier::new()
        .verify(&attester.address(), &restored)
        .unwrap());
}

#[test]
fn test_tampered_json_fails_verification() {
    init_tracing();
    let attester = Identity::generate();
    let signer = OffchainAttestationSigner::new(test_domain());
    let signed = signer
        .sign(&attester, is_human_request(Address([1u8; 20])))
        .unwrap();

    let mut value: serde_json::Value = serde_json::from_str(&signed.to_json().unwrap()).unwrap();
    value["recipient"] = serde_json::json!(Address([2u8; 20]).to_hex());
    let tampered: SignedOffchainAttestation = serde_json::from_value(value).unwrap();

    assert!(!OffchainAttestationVerifier::new()
        .verify(&attester.address(), &tampered)
        .unwrap());
}

#[test]
fn test_unknown_version_from_json() {
    init_tracing();
    let attester = Identity::generate();
    let signed = OffchainAttestationSigner::new(test_domain())
        .sign(&attester, is_human_request(Address::ZERO))
        .unwrap();

    let mut value: serde_json::Value = serde_json::from_str(&signed.to_json().unwrap()).unwrap();
    value["version"] = serde_json::json!(9);
    let future: SignedOffchainAttestation = serde_json::from_value(value).unwrap();

    assert!(matches!(
        OffchainAttestationVerifier::new().verify(&attester.address(), &future),
        Err(OffchainError::UnsupportedVersion(9))
    ));
}

#[test]
fn test_foreign_chain_rejected_by_trusted_domain() {
    init_tracing();
    let attester = Identity::generate();
    let mut foreign = test_domain();
    foreign.chain_id = 1;
    let signed = OffchainAttestationSigner::new(foreign)
        .sign(&attester, is_human_request(Address::ZERO))
        .unwrap();
    let verifier = OffchainAttestationVerifier::new();

    assert!(verifier.verify(&attester.address(), &signed).unwrap());
    assert!(!verifier
        .verify_with_domain(&attester.address(), &signed, &test_domain())
        .unwrap());
}

// =========================================================================
// Offchain revocation through the ledger
// =========================================================================

#[tokio::test]
async fn test_offchain_revocation_bridge() {
    init_tracing();
    let (_, client) = ledger_and_client();
    let attester = Identity::generate();
    let other = Identity::generate();
    let signed = OffchainAttestationSigner::new(test_domain())
        .sign(&attester, is_human_request(other.address()))
        .unwrap();
    let uid = signed.uid();

    assert_eq!(
        client
            .offchain_revocation_time(&attester.address(), &uid)
            .await
            .unwrap(),
        None
    );

    let revoked_at = client.revoke_offchain(&attester, uid).await.unwrap();
    assert_eq!(
        client
            .offchain_revocation_time(&attester.address(), &uid)
            .await
            .unwrap(),
        Some(revoked_at)
    );
    // A revocation by someone else does not count for the attester.
    assert_eq!(
        client
            .offchain_revocation_time(&other.address(), &uid)
            .await
            .unwrap(),
        None
    );

    let again = client.revoke_offchain(&attester, uid).await;
    assert_eq!(
        again.unwrap_err().revert_reason(),
        Some(RevertReason::AlreadyRevoked)
    );
}

// =========================================================================
// Configuration
// =========================================================================

#[test]
fn test_config_file_drives_signer() {
    init_tracing();
    let path = std::env::temp_dir().join(format!(
        "attest-config-{}.toml",
        Identity::generate().address()
    ));

    let mut config = test_config();
    config.offchain.attestation_version = VERSION_LEGACY;
    config.save(&path).unwrap();

    let loaded = AttestConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let signer = OffchainAttestationSigner::from_config(&loaded).unwrap();
    assert_eq!(signer.version(), VERSION_LEGACY);
    assert_eq!(signer.domain(), &test_domain());
}
