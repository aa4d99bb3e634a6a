use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::SchemaError;

/// Type of a schema field.
///
/// Unknown type tokens are rejected when the schema is parsed, so every
/// value reaching the codec has one of these shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    /// Unsigned integer of the given bit width (8..=256, multiple of 8).
    Uint(u16),
    /// Two's-complement signed integer of the given bit width.
    Int(u16),
    Address,
    /// `bytesN`, 1..=32 bytes.
    FixedBytes(usize),
    /// Dynamic `bytes`.
    Bytes,
    String,
    /// Dynamic-length array `T[]`.
    Array(Box<FieldType>),
    /// Fixed-length array `T[k]`.
    FixedArray(Box<FieldType>, usize),
}

impl FieldType {
    /// Whether values of this type live in the tail section of an encoding.
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::Bytes | Self::String | Self::Array(_) => true,
            Self::FixedArray(inner, _) => inner.is_dynamic(),
            _ => false,
        }
    }

    /// Number of bytes this type occupies in a head section.
    pub fn head_size(&self) -> usize {
        match self {
            // Parsed types never overflow; hand-built ones saturate.
            Self::FixedArray(inner, len) if !inner.is_dynamic() => {
                inner.head_size().saturating_mul(*len)
            }
            _ => 32,
        }
    }

    fn parse_elementary(token: &str) -> Result<Self, SchemaError> {
        let unknown = || SchemaError::SchemaSyntax(format!("unknown type '{}'", token));
        match token {
            "bool" => return Ok(Self::Bool),
            "address" => return Ok(Self::Address),
            "string" => return Ok(Self::String),
            "bytes" => return Ok(Self::Bytes),
            "uint" => return Ok(Self::Uint(256)),
            "int" => return Ok(Self::Int(256)),
            _ => {}
        }

        if let Some(width) = token.strip_prefix("uint") {
            let bits = parse_int_width(width).ok_or_else(unknown)?;
            return Ok(Self::Uint(bits));
        }
        if let Some(width) = token.strip_prefix("int") {
            let bits = parse_int_width(width).ok_or_else(unknown)?;
            return Ok(Self::Int(bits));
        }
        if let Some(size) = token.strip_prefix("bytes") {
            let n: usize = size.parse().map_err(|_| unknown())?;
            if !(1..=32).contains(&n) || size.starts_with('0') {
                return Err(unknown());
            }
            return Ok(Self::FixedBytes(n));
        }
        Err(unknown())
    }
}

fn parse_int_width(width: &str) -> Option<u16> {
    if width.starts_with('0') {
        return None;
    }
    let bits: u16 = width.parse().ok()?;
    (bits % 8 == 0 && (8..=256).contains(&bits)).then_some(bits)
}

impl FromStr for FieldType {
    type Err = SchemaError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = token.strip_suffix(']') {
            let open = rest.rfind('[').ok_or_else(|| {
                SchemaError::SchemaSyntax(format!("unbalanced brackets in type '{}'", token))
            })?;
            let inner: FieldType = rest[..open].parse()?;
            let dim = &rest[open + 1..];
            if dim.is_empty() {
                return Ok(Self::Array(Box::new(inner)));
            }
            let len: usize = dim.parse().map_err(|_| {
                SchemaError::SchemaSyntax(format!("invalid array length in type '{}'", token))
            })?;
            if len == 0 {
                return Err(SchemaError::SchemaSyntax(format!(
                    "zero-length array in type '{}'",
                    token
                )));
            }
            if !inner.is_dynamic() && inner.head_size().checked_mul(len).is_none() {
                return Err(SchemaError::SchemaSyntax(format!(
                    "array length overflows in type '{}'",
                    token
                )));
            }
            return Ok(Self::FixedArray(Box::new(inner), len));
        }
        Self::parse_elementary(token)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Uint(bits) => write!(f, "uint{}", bits),
            Self::Int(bits) => write!(f, "int{}", bits),
            Self::Address => write!(f, "address"),
            Self::FixedBytes(n) => write!(f, "bytes{}", n),
            Self::Bytes => write!(f, "bytes"),
            Self::String => write!(f, "string"),
            Self::Array(inner) => write!(f, "{}[]", inner),
            Self::FixedArray(inner, len) => write!(f, "{}[{}]", inner, len),
        }
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A named, typed field of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

impl fmt::Display for SchemaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field_type, self.name)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a schema definition such as `"uint256 eventId, uint8 voteIndex"`
/// into its fields, in declaration order.
///
/// The empty definition yields no fields.
pub fn parse(raw: &str) -> Result<Vec<SchemaField>, SchemaError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let mut fields = Vec::new();
    let mut seen = HashSet::new();

    for (index, part) in trimmed.split(',').enumerate() {
        let tokens: Vec<&str> = part.split_whitespace().collect();
        let [type_token, name] = tokens.as_slice() else {
            return Err(SchemaError::SchemaSyntax(format!(
                "field {} must be '<type> <name>', got '{}'",
                index,
                part.trim()
            )));
        };

        let field_type: FieldType = type_token.parse()?;

        if !is_identifier(name) {
            return Err(SchemaError::SchemaSyntax(format!(
                "invalid field name '{}'",
                name
            )));
        }
        if !seen.insert(name.to_string()) {
            return Err(SchemaError::SchemaSyntax(format!(
                "duplicate field name '{}'",
                name
            )));
        }

        fields.push(SchemaField::new(*name, field_type));
    }

    Ok(fields)
}
