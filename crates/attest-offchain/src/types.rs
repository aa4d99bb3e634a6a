use attest_core::types::hex_bytes;
use attest_core::{Address, Uid};
use attest_crypto::{hash, Hash, Signature};
use serde::{Deserialize, Serialize};

use crate::domain::OffchainDomain;
use crate::error::OffchainError;
use crate::typed::{signing_digest, StructHasher};

/// Unsalted offchain attestation.
pub const VERSION_LEGACY: u16 = 1;
/// Offchain attestation carrying a 32-byte random salt.
pub const VERSION_SALTED: u16 = 2;
/// Versions this crate signs and verifies.
pub const SUPPORTED_VERSIONS: [u16; 2] = [VERSION_LEGACY, VERSION_SALTED];

const ATTEST_TYPE_V1: &str = "Attest(bytes32 schema,address recipient,uint64 time,uint64 expirationTime,bool revocable,bytes32 refUID,bytes data)";
const ATTEST_TYPE_V2: &str = "Attest(uint16 version,bytes32 schema,address recipient,uint64 time,uint64 expirationTime,bool revocable,bytes32 refUID,bytes data,bytes32 salt)";

mod opt_salt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        salt: &Option<[u8; 32]>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match salt {
            Some(bytes) => serializer.serialize_str(&format!("0x{}", hex::encode(bytes))),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<[u8; 32]>, D::Error> {
        let Some(s) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let raw = hex::decode(s.strip_prefix("0x").unwrap_or(&s))
            .map_err(serde::de::Error::custom)?;
        raw.try_into()
            .map(Some)
            .map_err(|_| serde::de::Error::custom("salt must be 32 bytes"))
    }
}

/// What the attester wants to sign. Defaults: no expiration, not revocable,
/// no reference, empty data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OffchainAttestationRequest {
    pub schema: Uid,
    pub recipient: Address,
    pub expiration_time: u64,
    pub revocable: bool,
    pub ref_uid: Uid,
    pub data: Vec<u8>,
}

/// The signed message of an offchain attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffchainAttestation {
    pub version: u16,
    pub schema: Uid,
    pub recipient: Address,
    /// Signing time (seconds).
    pub time: u64,
    pub expiration_time: u64,
    pub revocable: bool,
    #[serde(rename = "refUID")]
    pub ref_uid: Uid,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    /// Present exactly when `version` is [`VERSION_SALTED`].
    #[serde(
        default,
        with = "opt_salt",
        skip_serializing_if = "Option::is_none"
    )]
    pub salt: Option<[u8; 32]>,
}

impl OffchainAttestation {
    /// Reject unknown versions and salt/version combinations that would
    /// leave the salt unsigned or missing.
    pub fn check_version(&self) -> Result<(), OffchainError> {
        match (self.version, self.salt.is_some()) {
            (VERSION_LEGACY, false) | (VERSION_SALTED, true) => Ok(()),
            (VERSION_LEGACY, true) => Err(OffchainError::Malformed(
                "version 1 attestation carries a salt".into(),
            )),
            (VERSION_SALTED, false) => Err(OffchainError::Malformed(
                "version 2 attestation has no salt".into(),
            )),
            (other, _) => Err(OffchainError::UnsupportedVersion(other)),
        }
    }

    /// Typed structured-data hash of the message.
    pub fn struct_hash(&self) -> Result<Hash, OffchainError> {
        self.check_version()?;
        let hasher = match self.salt {
            None => StructHasher::new(ATTEST_TYPE_V1),
            Some(_) => StructHasher::new(ATTEST_TYPE_V2).uint(u64::from(self.version)),
        };
        let hasher = hasher
            .word(self.schema.as_bytes())
            .address(&self.recipient)
            .uint(self.time)
            .uint(self.expiration_time)
            .boolean(self.revocable)
            .word(self.ref_uid.as_bytes())
            .dynamic(&self.data);
        let hasher = match &self.salt {
            Some(salt) => hasher.word(salt),
            None => hasher,
        };
        Ok(hasher.finish())
    }

    /// Digest the attester signs under `domain`.
    pub fn signing_digest(&self, domain: &OffchainDomain) -> Result<Hash, OffchainError> {
        Ok(signing_digest(&domain.separator(), &self.struct_hash()?))
    }

    pub fn uid(&self) -> Uid {
        offchain_uid(self)
    }
}

/// Identifier of an offchain attestation; the key under which its attester
/// revokes it on the ledger.
///
/// Packed layout: `version (2) || schema (32) || recipient (20) || time (8)
/// || expiration (8) || revocable (1) || refUID (32) || salt (0 or 32) ||
/// data`, integers big-endian.
pub fn offchain_uid(attestation: &OffchainAttestation) -> Uid {
    let mut input = Vec::with_capacity(135 + attestation.data.len());
    input.extend_from_slice(&attestation.version.to_be_bytes());
    input.extend_from_slice(attestation.schema.as_bytes());
    input.extend_from_slice(attestation.recipient.as_bytes());
    input.extend_from_slice(&attestation.time.to_be_bytes());
    input.extend_from_slice(&attestation.expiration_time.to_be_bytes());
    input.push(attestation.revocable as u8);
    input.extend_from_slice(attestation.ref_uid.as_bytes());
    if let Some(salt) = &attestation.salt {
        input.extend_from_slice(salt);
    }
    input.extend_from_slice(&attestation.data);
    Uid(hash(&input))
}

/// An offchain attestation with the domain it was signed under and the
/// attester's signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOffchainAttestation {
    #[serde(flatten)]
    pub message: OffchainAttestation,
    pub domain: OffchainDomain,
    pub signature: Signature,
}

impl SignedOffchainAttestation {
    pub fn uid(&self) -> Uid {
        self.message.uid()
    }

    /// Digest under the embedded domain.
    pub fn digest(&self) -> Result<Hash, OffchainError> {
        self.message.signing_digest(&self.domain)
    }

    pub fn to_json(&self) -> Result<String, OffchainError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, OffchainError> {
        Ok(serde_json::from_str(json)?)
    }
}
