use attest_core::{Address, Attestation, Uid};

/// BLAKE3 hash (32 bytes).
pub type Hash = [u8; 32];

/// Hash arbitrary data using BLAKE3.
pub fn hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Derive a schema identifier from `(schema, resolver, revocable)`.
///
/// Packed layout: `schema bytes || resolver (20) || revocable (1)`. The only
/// variable-length component comes first, so the layout is unambiguous.
pub fn schema_uid(schema: &str, resolver: &Address, revocable: bool) -> Uid {
    let mut input = Vec::with_capacity(schema.len() + 21);
    input.extend_from_slice(schema.as_bytes());
    input.extend_from_slice(resolver.as_bytes());
    input.push(revocable as u8);
    Uid(hash(&input))
}

/// Derive an attestation identifier from every field of `attestation`
/// except `uid` and `revocation_time`, plus a collision `bump`.
///
/// Packed layout: `schema (32) || recipient (20) || attester (20) ||
/// time (8) || expiration (8) || revocable (1) || refUID (32) || data ||
/// bump (4)`, integers big-endian.
pub fn attestation_uid(attestation: &Attestation, bump: u32) -> Uid {
    let mut input = Vec::with_capacity(121 + attestation.data.len() + 4);
    input.extend_from_slice(attestation.schema.as_bytes());
    input.extend_from_slice(attestation.recipient.as_bytes());
    input.extend_from_slice(attestation.attester.as_bytes());
    input.extend_from_slice(&attestation.time.to_be_bytes());
    input.extend_from_slice(&attestation.expiration_time.to_be_bytes());
    input.push(attestation.revocable as u8);
    input.extend_from_slice(attestation.ref_uid.as_bytes());
    input.extend_from_slice(&attestation.data);
    input.extend_from_slice(&bump.to_be_bytes());
    Uid(hash(&input))
}
