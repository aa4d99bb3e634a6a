use attest_core::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::field::FieldType;

pub use alloy_primitives::{I256, U256};

/// Whether `value` is representable as a two's-complement `int<bits>`.
pub fn int_fits(value: &I256, bits: u16) -> bool {
    if bits >= 256 {
        return true;
    }
    if bits == 0 {
        return value.is_zero();
    }
    let half = U256::from(1u64) << (bits as usize - 1);
    let max = I256::from_raw(half - U256::from(1u64));
    let min = I256::from_raw(half.wrapping_neg());
    *value >= min && *value <= max
}

/// Decimal string form for 256-bit numbers in JSON, since they overflow
/// JSON numbers.
mod decimal {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn serialize<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Value of a single schema field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaValue {
    Bool(bool),
    Uint(#[serde(with = "decimal")] U256),
    Int(#[serde(with = "decimal")] I256),
    Address(Address),
    /// Contents of a `bytesN` field; length must equal N.
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    /// Elements of a `T[]` or `T[k]` field.
    Array(Vec<SchemaValue>),
}

impl SchemaValue {
    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Uint(_) => "uint",
            Self::Int(_) => "int",
            Self::Address(_) => "address",
            Self::FixedBytes(_) => "fixed bytes",
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
            Self::Array(_) => "array",
        }
    }

    pub fn uint(value: u64) -> Self {
        Self::Uint(U256::from(value))
    }

    pub fn int(value: i64) -> Self {
        let magnitude = I256::from_raw(U256::from(value.unsigned_abs()));
        Self::Int(if value < 0 { -magnitude } else { magnitude })
    }
}

impl fmt::Display for SchemaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Uint(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Address(a) => write!(f, "{}", a),
            Self::FixedBytes(b) | Self::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Self::String(s) => write!(f, "{}", s),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// One entry of an attestation payload: a value together with the name and
/// type it claims to satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaItem {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub value: SchemaValue,
}

/// Ordered payload matching a schema's fields by position.
pub type AttestationPayload = Vec<SchemaItem>;

impl SchemaItem {
    pub fn new(name: impl Into<String>, field_type: FieldType, value: SchemaValue) -> Self {
        Self {
            name: name.into(),
            field_type,
            value,
        }
    }

    /// Create a `bool` item.
    pub fn bool(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, FieldType::Bool, SchemaValue::Bool(value))
    }

    /// Create a `uintN` item.
    pub fn uint(name: impl Into<String>, bits: u16, value: u64) -> Self {
        Self::new(name, FieldType::Uint(bits), SchemaValue::uint(value))
    }

    /// Create an `address` item.
    pub fn address(name: impl Into<String>, value: Address) -> Self {
        Self::new(name, FieldType::Address, SchemaValue::Address(value))
    }

    /// Create a `string` item.
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, FieldType::String, SchemaValue::String(value.into()))
    }

    /// Create a dynamic `bytes` item.
    pub fn bytes(name: impl Into<String>, value: Vec<u8>) -> Self {
        Self::new(name, FieldType::Bytes, SchemaValue::Bytes(value))
    }
}

impl fmt::Display for SchemaItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}={}", self.field_type, self.name, self.value)
    }
}
