use std::fmt;

use attest_core::Address;
use attest_schema::SchemaError;
use serde::{Deserialize, Serialize};

/// Reason a ledger transaction reverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevertReason {
    /// The referenced schema is not registered.
    SchemaNotFound,
    /// The referenced attestation does not exist.
    AttestationNotFound,
    /// The caller did not create the attestation.
    NotAttester,
    /// A revocation time is already recorded.
    AlreadyRevoked,
    /// Revocation requested where the schema or attestation forbids it.
    RevocabilityConflict,
    /// A schema with the same UID is already registered.
    AlreadyExists,
    /// The attestation belongs to a different schema than the one given.
    SchemaMismatch,
    /// The expiration time is not in the future.
    InvalidExpirationTime,
    /// A non-zero `refUID` does not name an existing attestation.
    InvalidReference,
}

impl fmt::Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaNotFound => write!(f, "SchemaNotFound"),
            Self::AttestationNotFound => write!(f, "AttestationNotFound"),
            Self::NotAttester => write!(f, "NotAttester"),
            Self::AlreadyRevoked => write!(f, "AlreadyRevoked"),
            Self::RevocabilityConflict => write!(f, "RevocabilityConflict"),
            Self::AlreadyExists => write!(f, "AlreadyExists"),
            Self::SchemaMismatch => write!(f, "SchemaMismatch"),
            Self::InvalidExpirationTime => write!(f, "InvalidExpirationTime"),
            Self::InvalidReference => write!(f, "InvalidReference"),
        }
    }
}

/// Ledger client errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Transport failure; the caller may retry.
    #[error("network error: {0}")]
    Network(String),

    /// The transaction was included and reverted. Retrying reproduces it.
    #[error("transaction reverted: {0}")]
    Revert(RevertReason),

    #[error("invalid nonce for {account}: expected {expected}, got {actual}")]
    InvalidNonce {
        account: Address,
        expected: u64,
        actual: u64,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}

impl LedgerError {
    /// The revert reason, if this is a revert.
    pub fn revert_reason(&self) -> Option<RevertReason> {
        match self {
            Self::Revert(reason) => Some(*reason),
            _ => None,
        }
    }
}
