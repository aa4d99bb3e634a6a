//! Integration test: schema definitions and payload encoding as they are
//! used for attestation data.

use attest_core::Address;
use attest_integration_tests::init_tracing;
use attest_schema::{FieldType, SchemaEncoder, SchemaError, SchemaItem, SchemaValue, U256};

fn item(name: &str, ty: &str, value: SchemaValue) -> SchemaItem {
    SchemaItem::new(name, ty.parse::<FieldType>().unwrap(), value)
}

// =========================================================================
// Mixed static and dynamic fields
// =========================================================================

#[test]
fn test_profile_schema_round_trip() {
    init_tracing();
    let encoder = SchemaEncoder::new(
        "address wallet, string handle, int32 delta, bytes32 proof, bytes extra, uint16[] scores, string[2] tags, bool verified",
    )
    .unwrap();

    let payload = vec![
        item("wallet", "address", SchemaValue::Address(Address([0x9a; 20]))),
        item("handle", "string", SchemaValue::String("satoshi".into())),
        item("delta", "int32", SchemaValue::int(-1234i64)),
        item("proof", "bytes32", SchemaValue::FixedBytes(vec![0x77; 32])),
        item("extra", "bytes", SchemaValue::Bytes(vec![1, 2, 3])),
        item(
            "scores",
            "uint16[]",
            SchemaValue::Array(vec![SchemaValue::uint(10u64), SchemaValue::uint(65535u64)]),
        ),
        item(
            "tags",
            "string[2]",
            SchemaValue::Array(vec![
                SchemaValue::String("a".into()),
                SchemaValue::String("a much longer tag that spans more than one word".into()),
            ]),
        ),
        item("verified", "bool", SchemaValue::Bool(true)),
    ];

    let data = encoder.encode(&payload).unwrap();
    assert_eq!(data.len() % 32, 0);
    assert_eq!(encoder.decode(&data).unwrap(), payload);
}

#[test]
fn test_static_schema_is_one_word_per_field() {
    init_tracing();
    let encoder = SchemaEncoder::new("uint256 eventId, uint8 voteIndex, bool voted").unwrap();
    let data = encoder
        .encode(&[
            SchemaItem::uint("eventId", 256, 1u64),
            SchemaItem::uint("voteIndex", 8, 2u64),
            SchemaItem::bool("voted", false),
        ])
        .unwrap();
    assert_eq!(data.len(), 96);
    assert_eq!(data[31], 1);
    assert_eq!(data[63], 2);
    assert!(data[64..].iter().all(|b| *b == 0));
}

#[test]
fn test_empty_schema() {
    init_tracing();
    let encoder = SchemaEncoder::new("").unwrap();
    assert!(encoder.fields().is_empty());
    assert!(encoder.encode(&[]).unwrap().is_empty());
    assert!(encoder.decode(&[]).unwrap().is_empty());
}

// =========================================================================
// Validation errors
// =========================================================================

#[test]
fn test_validation_errors() {
    init_tracing();
    let encoder = SchemaEncoder::new("uint8 level, string name").unwrap();

    let overflow = encoder.encode(&[
        SchemaItem::uint("level", 8, 256u64),
        SchemaItem::string("name", "x"),
    ]);
    assert!(matches!(overflow, Err(SchemaError::TypeMismatch { .. })));

    let missing = encoder.encode(&[SchemaItem::uint("level", 8, 1u64)]);
    assert_eq!(missing, Err(SchemaError::MissingField("name".into())));

    let extra = encoder.encode(&[
        SchemaItem::uint("level", 8, 1u64),
        SchemaItem::string("name", "x"),
        SchemaItem::bool("admin", true),
    ]);
    assert_eq!(extra, Err(SchemaError::UnexpectedField("admin".into())));

    assert!(matches!(
        SchemaEncoder::new("uint8 level, float ratio"),
        Err(SchemaError::SchemaSyntax(_))
    ));
}

#[test]
fn test_truncated_data_is_malformed() {
    init_tracing();
    let encoder = SchemaEncoder::new("string name").unwrap();
    let data = encoder.encode(&[SchemaItem::string("name", "hello")]).unwrap();
    assert!(matches!(
        encoder.decode(&data[..data.len() - 32]),
        Err(SchemaError::MalformedEncoding(_))
    ));
}

#[test]
fn test_oversized_fixed_arrays_fail_cleanly() {
    init_tracing();
    assert!(matches!(
        SchemaEncoder::new("uint8[1000000000000000000] a"),
        Err(SchemaError::SchemaSyntax(_))
    ));

    let encoder = SchemaEncoder::new("string[1000000000000000] a").unwrap();
    let mut data = vec![0u8; 64];
    data[31] = 32;
    assert!(matches!(
        encoder.decode(&data),
        Err(SchemaError::MalformedEncoding(_))
    ));
}

#[test]
fn test_large_uint_values() {
    init_tracing();
    let encoder = SchemaEncoder::new("uint256 supply").unwrap();
    let payload = [SchemaItem::new(
        "supply",
        FieldType::Uint(256),
        SchemaValue::Uint(U256::MAX),
    )];
    let data = encoder.encode(&payload).unwrap();
    assert!(data.iter().all(|b| *b == 0xff));
    assert_eq!(encoder.decode(&data).unwrap(), payload.to_vec());
}
