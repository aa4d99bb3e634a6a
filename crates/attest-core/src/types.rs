use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Expiration time meaning "never expires".
pub const NO_EXPIRATION: u64 = 0;

/// Current wall-clock time in whole seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Decode an optionally `0x`-prefixed hex string into exactly `N` bytes.
fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], CoreError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped).map_err(|e| CoreError::InvalidHex(e.to_string()))?;
    bytes.try_into().map_err(|b: Vec<u8>| CoreError::InvalidLength {
        expected: N,
        actual: b.len(),
    })
}

/// 20-byte account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address (no resolver, no recipient).
    pub const ZERO: Address = Address([0u8; 20]);

    /// Create from a byte slice (must be 20 bytes).
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; 20] = bytes.try_into().map_err(|_| CoreError::InvalidLength {
            expected: 20,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Encode as `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<20>(s).map(Self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 32-byte content-derived identifier for schemas and attestations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Uid(pub [u8; 32]);

impl Uid {
    /// The all-zero identifier ("no parent attestation").
    pub const ZERO: Uid = Uid([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Encode as `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Uid {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Uid {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<32>(s).map(Self)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Uid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Uid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Serde helper encoding `Vec<u8>` as a `0x`-prefixed hex string.
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let stripped = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(stripped).map_err(serde::de::Error::custom)
    }
}

/// A registered schema as stored by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRecord {
    /// Identifier derived from `(schema, resolver, revocable)`.
    pub uid: Uid,
    /// Raw definition string, e.g. `"uint256 eventId, bool voted"`.
    pub schema: String,
    /// Resolver contract consulted on attest/revoke (zero for none).
    pub resolver: Address,
    /// Whether attestations under this schema may be revoked.
    pub revocable: bool,
}

/// An on-ledger attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attestation {
    pub uid: Uid,
    pub schema: Uid,
    pub attester: Address,
    pub recipient: Address,
    /// Ledger time of inclusion (seconds).
    pub time: u64,
    /// Expiration time in seconds, [`NO_EXPIRATION`] for none.
    pub expiration_time: u64,
    pub revocable: bool,
    #[serde(rename = "refUID")]
    pub ref_uid: Uid,
    /// Schema-encoded payload.
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    /// Set exactly once by a successful revocation.
    pub revocation_time: Option<u64>,
}

impl Attestation {
    pub fn is_revoked(&self) -> bool {
        self.revocation_time.is_some()
    }

    /// Whether the attestation has expired as of `now`.
    pub fn is_expired(&self, now: u64) -> bool {
        self.expiration_time != NO_EXPIRATION && self.expiration_time <= now
    }

    /// Neither revoked nor expired as of `now`.
    pub fn is_valid(&self, now: u64) -> bool {
        !self.is_revoked() && !self.is_expired(now)
    }
}
