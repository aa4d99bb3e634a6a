//! Integration test: onchain attestation lifecycle.
//!
//! Registers schemas, attests with encoded payloads, follows references and
//! revokes, all through `LedgerAttestationClient` against the in-memory
//! ledger.

use std::sync::Arc;
use std::time::Duration;

use attest_core::{Address, NO_EXPIRATION};
use attest_crypto::{schema_uid, Identity};
use attest_integration_tests::{init_tracing, ledger_and_client};
use attest_ledger::{
    AttestationLedger, AttestationRequest, InMemoryLedger, LedgerAttestationClient, LedgerError,
    RevertReason, SchemaRegistration,
};
use attest_schema::{SchemaEncoder, SchemaItem, SchemaValue};

fn revert_of<T: std::fmt::Debug>(result: Result<T, LedgerError>) -> RevertReason {
    result
        .expect_err("transaction should revert")
        .revert_reason()
        .expect("error should be a revert")
}

// =========================================================================
// Schema registration
// =========================================================================

#[tokio::test]
async fn test_is_human_schema_scenario() {
    init_tracing();
    let (ledger, client) = ledger_and_client();
    let registrar = Identity::generate();
    let registration = SchemaRegistration::new("bool isHuman", Address::ZERO, true);

    let first = client
        .register_schema(&registrar, registration.clone())
        .await
        .unwrap();
    let second = client
        .register_schema(&registrar, registration)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first, schema_uid("bool isHuman", &Address::ZERO, true));
    assert_eq!(ledger.schema_count(), 1);

    let record = client.get_schema(&first).await.unwrap();
    assert_eq!(record.schema, "bool isHuman");
    assert!(record.resolver.is_zero());
    assert!(record.revocable);

    let encoder = SchemaEncoder::new(&record.schema).unwrap();
    let data = encoder.encode(&[SchemaItem::bool("isHuman", true)]).unwrap();
    assert_eq!(data.len(), 32);
    let decoded = encoder.decode(&data).unwrap();
    assert_eq!(decoded, vec![SchemaItem::bool("isHuman", true)]);
}

#[tokio::test]
async fn test_registration_params_change_uid() {
    init_tracing();
    let (_, client) = ledger_and_client();
    let registrar = Identity::generate();

    let revocable = client
        .register_schema(&registrar, SchemaRegistration::new("bool ok", Address::ZERO, true))
        .await
        .unwrap();
    let irrevocable = client
        .register_schema(&registrar, SchemaRegistration::new("bool ok", Address::ZERO, false))
        .await
        .unwrap();
    let resolved = client
        .register_schema(
            &registrar,
            SchemaRegistration::new("bool ok", Address([1u8; 20]), true),
        )
        .await
        .unwrap();

    assert_ne!(revocable, irrevocable);
    assert_ne!(revocable, resolved);
    assert_ne!(irrevocable, resolved);
}

// =========================================================================
// Attest → read → revoke
// =========================================================================

#[tokio::test]
async fn test_vote_attestation_lifecycle() {
    init_tracing();
    let (ledger, client) = ledger_and_client();
    let attester = Identity::generate();
    let voter = Identity::generate();

    let schema_def = "uint256 eventId, uint8 voteIndex, bool voted";
    let schema = client
        .register_schema(&attester, SchemaRegistration::new(schema_def, Address::ZERO, true))
        .await
        .unwrap();
    let encoder = SchemaEncoder::new(schema_def).unwrap();
    let payload = vec![
        SchemaItem::uint("eventId", 256, 42u64),
        SchemaItem::uint("voteIndex", 8, 3u64),
        SchemaItem::bool("voted", true),
    ];

    let uid = client
        .attest_payload(
            &attester,
            &encoder,
            &payload,
            AttestationRequest {
                schema,
                recipient: voter.address(),
                revocable: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let attestation = client.get_attestation(&uid).await.unwrap();
    assert_eq!(attestation.attester, attester.address());
    assert_eq!(attestation.recipient, voter.address());
    assert_eq!(attestation.expiration_time, NO_EXPIRATION);
    assert!(attestation.is_valid(ledger.now()));
    assert_eq!(encoder.decode(&attestation.data).unwrap(), payload);

    let revoked_at = client.revoke(&attester, schema, uid).await.unwrap();
    let attestation = client.get_attestation(&uid).await.unwrap();
    assert_eq!(attestation.revocation_time, Some(revoked_at));
    assert!(!attestation.is_valid(ledger.now()));

    assert_eq!(
        revert_of(client.revoke(&attester, schema, uid).await),
        RevertReason::AlreadyRevoked
    );
    let attestation = client.get_attestation(&uid).await.unwrap();
    assert_eq!(attestation.revocation_time, Some(revoked_at));
}

#[tokio::test]
async fn test_irrevocable_schema_guards() {
    init_tracing();
    let (_, client) = ledger_and_client();
    let attester = Identity::generate();
    let schema = client
        .register_schema(&attester, SchemaRegistration::new("string badge", Address::ZERO, false))
        .await
        .unwrap();

    let revocable_request = AttestationRequest {
        schema,
        revocable: true,
        ..Default::default()
    };
    assert_eq!(
        revert_of(client.attest(&attester, revocable_request).await),
        RevertReason::RevocabilityConflict
    );

    let uid = client
        .attest(
            &attester,
            AttestationRequest {
                schema,
                revocable: false,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(
        revert_of(client.revoke(&attester, schema, uid).await),
        RevertReason::RevocabilityConflict
    );
    assert_eq!(client.get_attestation(&uid).await.unwrap().revocation_time, None);
}

#[tokio::test]
async fn test_only_attester_may_revoke() {
    init_tracing();
    let (_, client) = ledger_and_client();
    let attester = Identity::generate();
    let stranger = Identity::generate();
    let schema = client
        .register_schema(&attester, SchemaRegistration::new("bool ok", Address::ZERO, true))
        .await
        .unwrap();
    let uid = client
        .attest(
            &attester,
            AttestationRequest {
                schema,
                revocable: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(
        revert_of(client.revoke(&stranger, schema, uid).await),
        RevertReason::NotAttester
    );
    assert!(!client.get_attestation(&uid).await.unwrap().is_revoked());
}

#[tokio::test]
async fn test_references_and_expiration() {
    init_tracing();
    let (ledger, client) = ledger_and_client();
    ledger.set_time(1_700_000_000);
    let attester = Identity::generate();
    let schema = client
        .register_schema(&attester, SchemaRegistration::new("bool ok", Address::ZERO, true))
        .await
        .unwrap();

    let parent = client
        .attest(
            &attester,
            AttestationRequest {
                schema,
                expiration_time: 1_700_000_100,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let child = client
        .attest(
            &attester,
            AttestationRequest {
                schema,
                ref_uid: parent,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(client.get_attestation(&child).await.unwrap().ref_uid, parent);

    let dangling = AttestationRequest {
        schema,
        ref_uid: attest_core::Uid([0xee; 32]),
        ..Default::default()
    };
    assert_eq!(
        revert_of(client.attest(&attester, dangling).await),
        RevertReason::InvalidReference
    );

    let past = AttestationRequest {
        schema,
        expiration_time: 1_699_999_999,
        ..Default::default()
    };
    assert_eq!(
        revert_of(client.attest(&attester, past).await),
        RevertReason::InvalidExpirationTime
    );

    ledger.set_time(1_700_000_100);
    let parent = client.get_attestation(&parent).await.unwrap();
    assert!(parent.is_expired(ledger.now()));
}

#[tokio::test]
async fn test_missing_records_are_not_found() {
    init_tracing();
    let (_, client) = ledger_and_client();
    let unknown = attest_core::Uid([0x11; 32]);
    assert!(matches!(client.get_schema(&unknown).await, Err(LedgerError::NotFound(_))));
    assert!(matches!(
        client.get_attestation(&unknown).await,
        Err(LedgerError::NotFound(_))
    ));
}

// =========================================================================
// Concurrency
// =========================================================================

#[tokio::test]
async fn test_parallel_writers_keep_nonces_in_order() {
    init_tracing();
    let ledger = Arc::new(InMemoryLedger::new(1).with_confirmation_delay(Duration::from_millis(2)));
    let client = Arc::new(LedgerAttestationClient::new(ledger.clone()));
    let attesters: Vec<Arc<Identity>> = (0..3).map(|_| Arc::new(Identity::generate())).collect();

    let schema = client
        .register_schema(&attesters[0], SchemaRegistration::new("address[] members", Address::ZERO, true))
        .await
        .unwrap();
    let encoder = Arc::new(SchemaEncoder::new("address[] members").unwrap());

    let mut tasks = Vec::new();
    for attester in &attesters {
        for _ in 0..5 {
            let client = client.clone();
            let attester = attester.clone();
            let encoder = encoder.clone();
            tasks.push(tokio::spawn(async move {
                let payload = [SchemaItem::new(
                    "members",
                    "address[]".parse().unwrap(),
                    SchemaValue::Array(vec![SchemaValue::Address(attester.address())]),
                )];
                client
                    .attest_payload(
                        &attester,
                        &encoder,
                        &payload,
                        AttestationRequest {
                            schema,
                            ..Default::default()
                        },
                    )
                    .await
            }));
        }
    }

    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert_eq!(ledger.attestation_count(), 15);
    for (i, attester) in attesters.iter().enumerate() {
        let expected = if i == 0 { 6 } else { 5 };
        assert_eq!(
            ledger.transaction_count(&attester.address()).await.unwrap(),
            expected
        );
    }
}
