//! Attest Schema: schema definition parsing and the word-aligned payload
//! codec used for attestation data.

pub mod encoder;
pub mod error;
pub mod field;
pub mod value;

pub use encoder::{decode, decode_values, encode, encode_values, SchemaEncoder, WORD_SIZE};
pub use error::SchemaError;
pub use field::{parse, FieldType, SchemaField};
pub use value::{AttestationPayload, SchemaItem, SchemaValue, I256, U256};
