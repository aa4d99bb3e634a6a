/// Cryptographic operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("signature recovery failed")]
    RecoveryFailed,

    #[error("signing failed: {0}")]
    SigningError(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
