use attest_core::Address;
use k256::ecdsa::{RecoveryId, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::hashing::Hash;
use crate::keys::{Identity, PublicKey};

/// Offset added to the recovery id in `v`.
const V_OFFSET: u8 = 27;

mod hex32 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        let raw = hex::decode(s.strip_prefix("0x").unwrap_or(&s))
            .map_err(serde::de::Error::custom)?;
        raw.try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
    }
}

/// Recoverable ECDSA signature in `{v, r, s}` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Recovery id plus 27.
    pub v: u8,
    #[serde(with = "hex32")]
    pub r: [u8; 32],
    #[serde(with = "hex32")]
    pub s: [u8; 32],
}

impl Signature {
    /// Concatenated `r || s || v` (65 bytes).
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    /// Parse `r || s || v` (65 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 65 {
            return Err(CryptoError::InvalidInput(format!(
                "signature must be 65 bytes, got {}",
                bytes.len()
            )));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { v: bytes[64], r, s })
    }

    /// Encode as hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

/// Sign a 32-byte digest with the identity's key.
pub fn sign_digest(digest: &Hash, identity: &Identity) -> Result<Signature, CryptoError> {
    let (sig, recovery_id) = identity
        .signing_key()
        .sign_prehash_recoverable(digest)
        .map_err(|e| CryptoError::SigningError(e.to_string()))?;
    let bytes = sig.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[..32]);
    s.copy_from_slice(&bytes[32..]);
    Ok(Signature {
        v: recovery_id.to_byte() + V_OFFSET,
        r,
        s,
    })
}

/// Recover the public key that produced `signature` over `digest`.
pub fn recover(digest: &Hash, signature: &Signature) -> Result<PublicKey, CryptoError> {
    let recovery_id = signature
        .v
        .checked_sub(V_OFFSET)
        .and_then(RecoveryId::from_byte)
        .ok_or_else(|| CryptoError::InvalidInput(format!("invalid v value {}", signature.v)))?;

    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(&signature.r);
    rs[32..].copy_from_slice(&signature.s);
    let sig = k256::ecdsa::Signature::from_slice(&rs)
        .map_err(|e| CryptoError::InvalidInput(format!("invalid signature: {}", e)))?;

    let verifying_key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailed)?;
    Ok(PublicKey::from(verifying_key))
}

/// Recover the signer's address.
pub fn recover_address(digest: &Hash, signature: &Signature) -> Result<Address, CryptoError> {
    recover(digest, signature).map(|pk| pk.address())
}

/// Whether `signature` over `digest` recovers to `expected`.
/// Malformed signatures count as a mismatch.
pub fn verify_address(digest: &Hash, signature: &Signature, expected: &Address) -> bool {
    match recover_address(digest, signature) {
        Ok(addr) => addr == *expected,
        Err(e) => {
            tracing::debug!(error = %e, "signature recovery failed");
            false
        }
    }
}
