use async_trait::async_trait;
use attest_core::{Address, Attestation, SchemaRecord, Uid};

use crate::error::LedgerError;
use crate::types::{
    AttestationRequest, RevocationRequest, SchemaRegistration, TransactionHandle, TxEnvelope,
};

/// Ledger adapter interface.
///
/// Each implementation bridges the client to a concrete deployment of the
/// schema registry and attestation service. Submissions either return a
/// handle (accepted for inclusion) or fail immediately; reverts surface
/// through the handle.
#[async_trait]
pub trait AttestationLedger: Send + Sync {
    /// Chain identifier used for offchain domain separation.
    fn chain_id(&self) -> u64;

    /// Next nonce the ledger expects from `account`.
    async fn transaction_count(&self, account: &Address) -> Result<u64, LedgerError>;

    /// Register a schema. Resolves to the schema UID.
    async fn register(
        &self,
        tx: TxEnvelope,
        registration: SchemaRegistration,
    ) -> Result<TransactionHandle<Uid>, LedgerError>;

    /// Create an attestation. Resolves to the attestation UID.
    async fn attest(
        &self,
        tx: TxEnvelope,
        request: AttestationRequest,
    ) -> Result<TransactionHandle<Uid>, LedgerError>;

    /// Revoke an attestation. Resolves to the recorded revocation time.
    async fn revoke(
        &self,
        tx: TxEnvelope,
        request: RevocationRequest,
    ) -> Result<TransactionHandle<u64>, LedgerError>;

    /// Record the sender's revocation of an offchain attestation UID.
    /// Resolves to the recorded revocation time.
    async fn revoke_offchain(
        &self,
        tx: TxEnvelope,
        uid: Uid,
    ) -> Result<TransactionHandle<u64>, LedgerError>;

    async fn get_schema(&self, uid: &Uid) -> Result<Option<SchemaRecord>, LedgerError>;

    async fn get_attestation(&self, uid: &Uid) -> Result<Option<Attestation>, LedgerError>;

    /// Time at which `revoker` revoked the offchain `uid`, if ever.
    async fn offchain_revocation(
        &self,
        revoker: &Address,
        uid: &Uid,
    ) -> Result<Option<u64>, LedgerError>;
}
