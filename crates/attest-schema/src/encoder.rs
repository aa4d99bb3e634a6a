//! Word-aligned payload codec.
//!
//! Every static value occupies one 32-byte word (fixed arrays of static
//! types occupy one word per element). Dynamic values are written to a tail
//! section and referenced from the head by a byte offset relative to the
//! start of the enclosing tuple; the tail entry starts with a length word.

use attest_core::Address;

use crate::error::SchemaError;
use crate::field::{parse, FieldType, SchemaField};
use crate::value::{int_fits, AttestationPayload, SchemaItem, SchemaValue, I256, U256};

/// Canonical word size in bytes.
pub const WORD_SIZE: usize = 32;

fn mismatch(field: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::TypeMismatch {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn malformed(reason: impl Into<String>) -> SchemaError {
    SchemaError::MalformedEncoding(reason.into())
}

fn usize_word(value: usize) -> [u8; WORD_SIZE] {
    let mut word = [0u8; WORD_SIZE];
    word[24..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD_SIZE) * WORD_SIZE
}

fn encode_dynamic_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(WORD_SIZE + padded_len(bytes.len()));
    out.extend_from_slice(&usize_word(bytes.len()));
    out.extend_from_slice(bytes);
    out.resize(WORD_SIZE + padded_len(bytes.len()), 0);
    out
}

fn encode_tuple(items: &[(&str, &FieldType, &SchemaValue)]) -> Result<Vec<u8>, SchemaError> {
    // Encode first: head sizes come from validated values, not declared lengths.
    let encoded = items
        .iter()
        .map(|(field, ty, value)| Ok((ty.is_dynamic(), encode_single(field, ty, value)?)))
        .collect::<Result<Vec<_>, SchemaError>>()?;
    let head_len: usize = encoded
        .iter()
        .map(|(dynamic, bytes)| if *dynamic { WORD_SIZE } else { bytes.len() })
        .sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for (dynamic, bytes) in encoded {
        if dynamic {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            tail.extend(bytes);
        } else {
            head.extend(bytes);
        }
    }

    head.extend(tail);
    Ok(head)
}

fn encode_single(field: &str, ty: &FieldType, value: &SchemaValue) -> Result<Vec<u8>, SchemaError> {
    match (ty, value) {
        (FieldType::Bool, SchemaValue::Bool(b)) => {
            let mut word = vec![0u8; WORD_SIZE];
            word[WORD_SIZE - 1] = *b as u8;
            Ok(word)
        }
        (FieldType::Uint(bits), SchemaValue::Uint(v)) => {
            if v.bit_len() > usize::from(*bits) {
                return Err(mismatch(field, format!("{} does not fit in uint{}", v, bits)));
            }
            Ok(v.to_be_bytes::<WORD_SIZE>().to_vec())
        }
        (FieldType::Int(bits), SchemaValue::Int(v)) => {
            if !int_fits(v, *bits) {
                return Err(mismatch(field, format!("{} does not fit in int{}", v, bits)));
            }
            Ok(v.into_raw().to_be_bytes::<WORD_SIZE>().to_vec())
        }
        (FieldType::Address, SchemaValue::Address(a)) => {
            let mut word = vec![0u8; WORD_SIZE];
            word[12..].copy_from_slice(a.as_bytes());
            Ok(word)
        }
        (FieldType::FixedBytes(n), SchemaValue::FixedBytes(b)) => {
            if b.len() != *n {
                return Err(mismatch(
                    field,
                    format!("bytes{} requires {} bytes, got {}", n, n, b.len()),
                ));
            }
            let mut word = b.clone();
            word.resize(WORD_SIZE, 0);
            Ok(word)
        }
        (FieldType::Bytes, SchemaValue::Bytes(b)) => Ok(encode_dynamic_bytes(b)),
        (FieldType::String, SchemaValue::String(s)) => Ok(encode_dynamic_bytes(s.as_bytes())),
        (FieldType::Array(inner), SchemaValue::Array(values)) => {
            let items: Vec<_> = values.iter().map(|v| (field, inner.as_ref(), v)).collect();
            let mut out = usize_word(values.len()).to_vec();
            out.extend(encode_tuple(&items)?);
            Ok(out)
        }
        (FieldType::FixedArray(inner, len), SchemaValue::Array(values)) => {
            if values.len() != *len {
                return Err(mismatch(
                    field,
                    format!("{} requires {} elements, got {}", ty, len, values.len()),
                ));
            }
            let items: Vec<_> = values.iter().map(|v| (field, inner.as_ref(), v)).collect();
            encode_tuple(&items)
        }
        _ => Err(mismatch(
            field,
            format!("expected {}, got {} value", ty, value.kind()),
        )),
    }
}

fn read_word(buf: &[u8], pos: usize) -> Result<&[u8], SchemaError> {
    let end = pos
        .checked_add(WORD_SIZE)
        .ok_or_else(|| malformed("offset overflow"))?;
    buf.get(pos..end).ok_or_else(|| {
        malformed(format!(
            "truncated input: need {} bytes at offset {}, have {}",
            WORD_SIZE,
            pos,
            buf.len()
        ))
    })
}

fn read_usize(buf: &[u8], pos: usize) -> Result<usize, SchemaError> {
    let word = read_word(buf, pos)?;
    if word[..24].iter().any(|b| *b != 0) {
        return Err(malformed(format!("length or offset at {} is too large", pos)));
    }
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(raw))
        .map_err(|_| malformed(format!("length or offset at {} is too large", pos)))
}

fn word_array(word: &[u8]) -> [u8; WORD_SIZE] {
    let mut out = [0u8; WORD_SIZE];
    out.copy_from_slice(word);
    out
}

fn decode_dynamic_bytes(buf: &[u8]) -> Result<Vec<u8>, SchemaError> {
    let len = read_usize(buf, 0)?;
    let padded = padded_len(len);
    let end = WORD_SIZE
        .checked_add(padded)
        .ok_or_else(|| malformed("length overflow"))?;
    if end > buf.len() {
        return Err(malformed(format!(
            "length prefix {} exceeds remaining {} bytes",
            len,
            buf.len() - WORD_SIZE
        )));
    }
    if buf[WORD_SIZE + len..end].iter().any(|b| *b != 0) {
        return Err(malformed("non-zero padding after dynamic bytes"));
    }
    Ok(buf[WORD_SIZE..WORD_SIZE + len].to_vec())
}

fn decode_tuple(types: &[&FieldType], buf: &[u8]) -> Result<Vec<SchemaValue>, SchemaError> {
    let mut values = Vec::with_capacity(types.len());
    let mut pos = 0usize;

    for ty in types {
        if ty.is_dynamic() {
            let offset = read_usize(buf, pos)?;
            if offset >= buf.len() {
                return Err(malformed(format!(
                    "offset {} points outside buffer of {} bytes",
                    offset,
                    buf.len()
                )));
            }
            values.push(decode_single(ty, &buf[offset..])?);
            pos += WORD_SIZE;
        } else {
            let size = ty.head_size();
            let end = pos
                .checked_add(size)
                .ok_or_else(|| malformed("offset overflow"))?;
            if end > buf.len() {
                return Err(malformed(format!(
                    "truncated input: need {} bytes, have {}",
                    end,
                    buf.len()
                )));
            }
            values.push(decode_single(ty, &buf[pos..end])?);
            pos = end;
        }
    }

    Ok(values)
}

fn decode_single(ty: &FieldType, buf: &[u8]) -> Result<SchemaValue, SchemaError> {
    match ty {
        FieldType::Bool => {
            let word = read_word(buf, 0)?;
            match (word[..31].iter().all(|b| *b == 0), word[31]) {
                (true, 0) => Ok(SchemaValue::Bool(false)),
                (true, 1) => Ok(SchemaValue::Bool(true)),
                _ => Err(malformed("bool word is neither 0 nor 1")),
            }
        }
        FieldType::Uint(bits) => {
            let v = U256::from_be_bytes(word_array(read_word(buf, 0)?));
            if v.bit_len() > usize::from(*bits) {
                return Err(malformed(format!("value exceeds uint{}", bits)));
            }
            Ok(SchemaValue::Uint(v))
        }
        FieldType::Int(bits) => {
            let v = I256::from_raw(U256::from_be_bytes(word_array(read_word(buf, 0)?)));
            if !int_fits(&v, *bits) {
                return Err(malformed(format!("value is not sign-extended int{}", bits)));
            }
            Ok(SchemaValue::Int(v))
        }
        FieldType::Address => {
            let word = read_word(buf, 0)?;
            if word[..12].iter().any(|b| *b != 0) {
                return Err(malformed("address word has non-zero high bytes"));
            }
            Ok(SchemaValue::Address(
                Address::from_slice(&word[12..]).map_err(|e| malformed(e.to_string()))?,
            ))
        }
        FieldType::FixedBytes(n) => {
            let word = read_word(buf, 0)?;
            if word[*n..].iter().any(|b| *b != 0) {
                return Err(malformed(format!("bytes{} has non-zero padding", n)));
            }
            Ok(SchemaValue::FixedBytes(word[..*n].to_vec()))
        }
        FieldType::Bytes => decode_dynamic_bytes(buf).map(SchemaValue::Bytes),
        FieldType::String => {
            let raw = decode_dynamic_bytes(buf)?;
            String::from_utf8(raw)
                .map(SchemaValue::String)
                .map_err(|_| malformed("string is not valid UTF-8"))
        }
        FieldType::Array(inner) => {
            let len = read_usize(buf, 0)?;
            let body = &buf[WORD_SIZE..];
            // Each element needs at least one head slot.
            let min = len
                .checked_mul(inner.head_size())
                .ok_or_else(|| malformed("array length overflow"))?;
            if min > body.len() {
                return Err(malformed(format!(
                    "array length {} exceeds remaining {} bytes",
                    len,
                    body.len()
                )));
            }
            let types = vec![inner.as_ref(); len];
            decode_tuple(&types, body).map(SchemaValue::Array)
        }
        FieldType::FixedArray(inner, len) => {
            let min = len
                .checked_mul(inner.head_size())
                .ok_or_else(|| malformed("array length overflow"))?;
            if min > buf.len() {
                return Err(malformed(format!(
                    "{} elements of {} exceed remaining {} bytes",
                    len,
                    inner,
                    buf.len()
                )));
            }
            let types = vec![inner.as_ref(); *len];
            decode_tuple(&types, buf).map(SchemaValue::Array)
        }
    }
}

/// Encode raw values against a list of types, with no name checking.
pub fn encode_values(types: &[FieldType], values: &[SchemaValue]) -> Result<Vec<u8>, SchemaError> {
    if types.len() != values.len() {
        return Err(mismatch(
            "",
            format!("expected {} values, got {}", types.len(), values.len()),
        ));
    }
    let items: Vec<_> = types.iter().zip(values).map(|(ty, v)| ("", ty, v)).collect();
    encode_tuple(&items)
}

/// Decode raw values for a list of types.
pub fn decode_values(types: &[FieldType], data: &[u8]) -> Result<Vec<SchemaValue>, SchemaError> {
    let refs: Vec<&FieldType> = types.iter().collect();
    decode_tuple(&refs, data)
}

/// Encode `payload` against `fields`.
///
/// Payload entries must match the fields one-to-one by position, name, and
/// declared type.
pub fn encode(fields: &[SchemaField], payload: &[SchemaItem]) -> Result<Vec<u8>, SchemaError> {
    for (index, field) in fields.iter().enumerate() {
        let item = payload
            .get(index)
            .filter(|item| item.name == field.name)
            .ok_or_else(|| SchemaError::MissingField(field.name.clone()))?;
        if item.field_type != field.field_type {
            return Err(mismatch(
                &field.name,
                format!("declared {}, payload says {}", field.field_type, item.field_type),
            ));
        }
    }
    if let Some(extra) = payload.get(fields.len()) {
        return Err(SchemaError::UnexpectedField(extra.name.clone()));
    }

    let items: Vec<_> = fields
        .iter()
        .zip(payload)
        .map(|(field, item)| (field.name.as_str(), &field.field_type, &item.value))
        .collect();
    let encoded = encode_tuple(&items)?;

    tracing::debug!(fields = fields.len(), bytes = encoded.len(), "payload encoded");
    Ok(encoded)
}

/// Decode `data` into a payload shaped by `fields`.
pub fn decode(fields: &[SchemaField], data: &[u8]) -> Result<AttestationPayload, SchemaError> {
    let types: Vec<&FieldType> = fields.iter().map(|f| &f.field_type).collect();
    let values = decode_tuple(&types, data)?;
    Ok(fields
        .iter()
        .zip(values)
        .map(|(field, value)| SchemaItem::new(field.name.clone(), field.field_type.clone(), value))
        .collect())
}

/// A parsed schema bundled with its raw definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEncoder {
    schema: String,
    fields: Vec<SchemaField>,
}

impl SchemaEncoder {
    /// Parse `schema` and build an encoder for it.
    pub fn new(schema: &str) -> Result<Self, SchemaError> {
        let fields = parse(schema)?;
        Ok(Self {
            schema: schema.to_string(),
            fields,
        })
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn encode(&self, payload: &[SchemaItem]) -> Result<Vec<u8>, SchemaError> {
        encode(&self.fields, payload)
    }

    pub fn decode(&self, data: &[u8]) -> Result<AttestationPayload, SchemaError> {
        decode(&self.fields, data)
    }
}
