use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use attest_core::{unix_now, Address, Attestation, SchemaRecord, Uid, NO_EXPIRATION};
use attest_crypto::{attestation_uid, hash, schema_uid};
use dashmap::DashMap;

use crate::error::{LedgerError, RevertReason};
use crate::traits::AttestationLedger;
use crate::types::{
    AttestationRequest, RevocationRequest, SchemaRegistration, TransactionHandle, TxEnvelope,
};

/// In-process ledger.
///
/// Holds the schema registry, the attestation store, and the offchain
/// revocation registry in memory and applies the same revert rules as a
/// deployed registry. Transactions are executed in submission order under a
/// single execution lock; nonces must arrive strictly in sequence.
pub struct InMemoryLedger {
    chain_id: u64,
    schemas: DashMap<Uid, SchemaRecord>,
    attestations: DashMap<Uid, Attestation>,
    /// (revoker, offchain uid) -> revocation time.
    offchain_revocations: DashMap<(Address, Uid), u64>,
    nonces: DashMap<Address, u64>,
    /// Ledger time override in seconds; zero follows the wall clock.
    fixed_time: AtomicU64,
    /// Delay between acceptance and confirmation of a transaction.
    confirmation_delay: Option<Duration>,
    execution: Mutex<()>,
}

impl InMemoryLedger {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            schemas: DashMap::new(),
            attestations: DashMap::new(),
            offchain_revocations: DashMap::new(),
            nonces: DashMap::new(),
            fixed_time: AtomicU64::new(0),
            confirmation_delay: None,
            execution: Mutex::new(()),
        }
    }

    /// Deliver transaction outcomes only after `delay` has elapsed.
    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = Some(delay);
        self
    }

    /// Pin the ledger clock to `time` (seconds). Zero restores the wall clock.
    pub fn set_time(&self, time: u64) {
        self.fixed_time.store(time, Ordering::SeqCst);
    }

    /// Current ledger time in seconds.
    pub fn now(&self) -> u64 {
        match self.fixed_time.load(Ordering::SeqCst) {
            0 => unix_now(),
            fixed => fixed,
        }
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    pub fn attestation_count(&self) -> usize {
        self.attestations.len()
    }

    fn transaction_hash(tx: &TxEnvelope, operation: &str) -> Uid {
        let mut input = Vec::with_capacity(20 + 8 + operation.len());
        input.extend_from_slice(tx.from.as_bytes());
        input.extend_from_slice(&tx.nonce.to_be_bytes());
        input.extend_from_slice(operation.as_bytes());
        Uid(hash(&input))
    }

    /// Check the nonce, execute the state transition, and hand back a handle
    /// that resolves to its outcome. A reverted transaction still consumes
    /// its nonce.
    fn submit<T, F>(
        &self,
        tx: TxEnvelope,
        operation: &'static str,
        execute: F,
    ) -> Result<TransactionHandle<T>, LedgerError>
    where
        T: Send + 'static,
        F: FnOnce(u64) -> Result<T, RevertReason>,
    {
        let outcome = {
            let _guard = self
                .execution
                .lock()
                .map_err(|_| LedgerError::Network("ledger execution lock poisoned".into()))?;

            let expected = self.nonces.get(&tx.from).map(|n| *n).unwrap_or(0);
            if tx.nonce != expected {
                tracing::warn!(
                    from = %tx.from,
                    expected,
                    actual = tx.nonce,
                    operation,
                    "Rejected out-of-order transaction"
                );
                return Err(LedgerError::InvalidNonce {
                    account: tx.from,
                    expected,
                    actual: tx.nonce,
                });
            }
            self.nonces.insert(tx.from, expected + 1);

            execute(self.now()).map_err(LedgerError::Revert)
        };

        let tx_hash = Self::transaction_hash(&tx, operation);
        match &outcome {
            Ok(_) => tracing::debug!(tx = %tx_hash, from = %tx.from, operation, "Transaction executed"),
            Err(e) => tracing::debug!(tx = %tx_hash, from = %tx.from, operation, error = %e, "Transaction reverted"),
        }

        Ok(self.deliver(tx_hash, outcome))
    }

    fn deliver<T: Send + 'static>(
        &self,
        tx_hash: Uid,
        outcome: Result<T, LedgerError>,
    ) -> TransactionHandle<T> {
        match self.confirmation_delay {
            None => TransactionHandle::settled(tx_hash, outcome),
            Some(delay) => {
                let (handle, sender) = TransactionHandle::pending(tx_hash);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = sender.send(outcome);
                });
                handle
            }
        }
    }

    fn execute_register(&self, registration: SchemaRegistration) -> Result<Uid, RevertReason> {
        let uid = schema_uid(
            &registration.schema,
            &registration.resolver,
            registration.revocable,
        );
        if self.schemas.contains_key(&uid) {
            return Err(RevertReason::AlreadyExists);
        }
        self.schemas.insert(
            uid,
            SchemaRecord {
                uid,
                schema: registration.schema,
                resolver: registration.resolver,
                revocable: registration.revocable,
            },
        );
        Ok(uid)
    }

    fn execute_attest(
        &self,
        attester: Address,
        request: AttestationRequest,
        now: u64,
    ) -> Result<Uid, RevertReason> {
        let schema_revocable = self
            .schemas
            .get(&request.schema)
            .map(|s| s.revocable)
            .ok_or(RevertReason::SchemaNotFound)?;

        if request.expiration_time != NO_EXPIRATION && request.expiration_time <= now {
            return Err(RevertReason::InvalidExpirationTime);
        }
        if request.revocable && !schema_revocable {
            return Err(RevertReason::RevocabilityConflict);
        }
        if !request.ref_uid.is_zero() && !self.attestations.contains_key(&request.ref_uid) {
            return Err(RevertReason::InvalidReference);
        }

        let mut attestation = Attestation {
            uid: Uid::ZERO,
            schema: request.schema,
            attester,
            recipient: request.recipient,
            time: now,
            expiration_time: request.expiration_time,
            revocable: request.revocable,
            ref_uid: request.ref_uid,
            data: request.data,
            revocation_time: None,
        };

        let mut bump = 0u32;
        let mut uid = attestation_uid(&attestation, bump);
        while self.attestations.contains_key(&uid) {
            bump += 1;
            uid = attestation_uid(&attestation, bump);
        }
        attestation.uid = uid;
        self.attestations.insert(uid, attestation);
        Ok(uid)
    }

    fn execute_revoke(
        &self,
        revoker: Address,
        request: RevocationRequest,
        now: u64,
    ) -> Result<u64, RevertReason> {
        let schema_revocable = self
            .schemas
            .get(&request.schema)
            .map(|s| s.revocable)
            .ok_or(RevertReason::SchemaNotFound)?;

        let mut attestation = self
            .attestations
            .get_mut(&request.uid)
            .ok_or(RevertReason::AttestationNotFound)?;

        if attestation.schema != request.schema {
            return Err(RevertReason::SchemaMismatch);
        }
        if !schema_revocable || !attestation.revocable {
            return Err(RevertReason::RevocabilityConflict);
        }
        if attestation.attester != revoker {
            return Err(RevertReason::NotAttester);
        }
        if attestation.revocation_time.is_some() {
            return Err(RevertReason::AlreadyRevoked);
        }

        attestation.revocation_time = Some(now);
        Ok(now)
    }

    fn execute_revoke_offchain(
        &self,
        revoker: Address,
        uid: Uid,
        now: u64,
    ) -> Result<u64, RevertReason> {
        let key = (revoker, uid);
        if self.offchain_revocations.contains_key(&key) {
            return Err(RevertReason::AlreadyRevoked);
        }
        self.offchain_revocations.insert(key, now);
        Ok(now)
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(1)
    }
}

#[async_trait]
impl AttestationLedger for InMemoryLedger {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn transaction_count(&self, account: &Address) -> Result<u64, LedgerError> {
        Ok(self.nonces.get(account).map(|n| *n).unwrap_or(0))
    }

    async fn register(
        &self,
        tx: TxEnvelope,
        registration: SchemaRegistration,
    ) -> Result<TransactionHandle<Uid>, LedgerError> {
        self.submit(tx, "register", |_| self.execute_register(registration))
    }

    async fn attest(
        &self,
        tx: TxEnvelope,
        request: AttestationRequest,
    ) -> Result<TransactionHandle<Uid>, LedgerError> {
        self.submit(tx, "attest", |now| self.execute_attest(tx.from, request, now))
    }

    async fn revoke(
        &self,
        tx: TxEnvelope,
        request: RevocationRequest,
    ) -> Result<TransactionHandle<u64>, LedgerError> {
        self.submit(tx, "revoke", |now| self.execute_revoke(tx.from, request, now))
    }

    async fn revoke_offchain(
        &self,
        tx: TxEnvelope,
        uid: Uid,
    ) -> Result<TransactionHandle<u64>, LedgerError> {
        self.submit(tx, "revoke_offchain", |now| {
            self.execute_revoke_offchain(tx.from, uid, now)
        })
    }

    async fn get_schema(&self, uid: &Uid) -> Result<Option<SchemaRecord>, LedgerError> {
        Ok(self.schemas.get(uid).map(|s| s.clone()))
    }

    async fn get_attestation(&self, uid: &Uid) -> Result<Option<Attestation>, LedgerError> {
        Ok(self.attestations.get(uid).map(|a| a.clone()))
    }

    async fn offchain_revocation(
        &self,
        revoker: &Address,
        uid: &Uid,
    ) -> Result<Option<u64>, LedgerError> {
        Ok(self.offchain_revocations.get(&(*revoker, *uid)).map(|t| *t))
    }
}
