use std::fmt;

use attest_core::Address;
use k256::ecdsa::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::hashing::hash;

/// A signing identity: a secp256k1 key pair and the address derived from it.
/// Private key material is zeroized on drop by `k256`.
pub struct Identity {
    signing_key: SigningKey,
}

impl Identity {
    /// Generate a new random identity using OS-provided entropy.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Create an identity from a 32-byte secret scalar.
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_slice(seed).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self { signing_key })
    }

    /// Create an identity from raw bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(bytes);
        let identity = Self::from_seed(&seed);
        seed.zeroize();
        identity
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key().clone(),
        }
    }

    /// The address signatures by this identity recover to.
    pub fn address(&self) -> Address {
        self.public_key().address()
    }

    /// Get the raw secret scalar (32 bytes).
    /// Prefer signing through this type.
    pub fn secret_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.signing_key.to_bytes());
        out
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// secp256k1 public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl PublicKey {
    /// Parse a SEC1-encoded point (compressed or uncompressed).
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let verifying_key = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid public key: {}", e)))?;
        Ok(Self { verifying_key })
    }

    /// Compressed SEC1 encoding (33 bytes).
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        self.verifying_key.to_encoded_point(true).as_bytes().to_vec()
    }

    /// Encode the compressed point as hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_sec1_bytes())
    }

    /// Last 20 bytes of the hash of the uncompressed point (without the
    /// `0x04` tag).
    pub fn address(&self) -> Address {
        let point = self.verifying_key.to_encoded_point(false);
        let digest = hash(&point.as_bytes()[1..]);
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest[12..]);
        Address(out)
    }
}

impl From<VerifyingKey> for PublicKey {
    fn from(verifying_key: VerifyingKey) -> Self {
        Self { verifying_key }
    }
}
