use attest_crypto::CryptoError;
use attest_schema::SchemaError;

/// Offchain attestation errors.
#[derive(Debug, thiserror::Error)]
pub enum OffchainError {
    #[error("unsupported offchain attestation version {0}")]
    UnsupportedVersion(u16),

    #[error("malformed attestation: {0}")]
    Malformed(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
