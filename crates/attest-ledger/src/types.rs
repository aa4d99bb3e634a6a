use attest_core::{Address, Uid};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::LedgerError;

/// Sender and sequence number of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxEnvelope {
    pub from: Address,
    pub nonce: u64,
}

/// Schema registration parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaRegistration {
    pub schema: String,
    pub resolver: Address,
    pub revocable: bool,
}

impl SchemaRegistration {
    pub fn new(schema: impl Into<String>, resolver: Address, revocable: bool) -> Self {
        Self {
            schema: schema.into(),
            resolver,
            revocable,
        }
    }
}

/// Parameters of an onchain attestation.
///
/// Defaults: no expiration, not revocable, no reference, empty data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationRequest {
    pub schema: Uid,
    pub recipient: Address,
    pub expiration_time: u64,
    pub revocable: bool,
    #[serde(rename = "refUID")]
    pub ref_uid: Uid,
    #[serde(with = "attest_core::types::hex_bytes")]
    pub data: Vec<u8>,
}

/// Parameters of an onchain revocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationRequest {
    pub schema: Uid,
    pub uid: Uid,
}

/// A submitted transaction whose outcome is delivered once it is included.
#[derive(Debug)]
pub struct TransactionHandle<T> {
    hash: Uid,
    receiver: oneshot::Receiver<Result<T, LedgerError>>,
}

impl<T> TransactionHandle<T> {
    /// A handle together with the sender that settles it.
    pub fn pending(hash: Uid) -> (Self, oneshot::Sender<Result<T, LedgerError>>) {
        let (tx, receiver) = oneshot::channel();
        (Self { hash, receiver }, tx)
    }

    /// A handle whose outcome is already known.
    pub fn settled(hash: Uid, outcome: Result<T, LedgerError>) -> Self {
        let (handle, tx) = Self::pending(hash);
        // The receiver is held by `handle`, so this send cannot fail.
        let _ = tx.send(outcome);
        handle
    }

    pub fn hash(&self) -> Uid {
        self.hash
    }

    /// Wait until the transaction is included and return its outcome.
    pub async fn wait(self) -> Result<T, LedgerError> {
        self.receiver.await.map_err(|_| {
            LedgerError::Network(format!(
                "transaction {} dropped before confirmation",
                self.hash
            ))
        })?
    }
}
