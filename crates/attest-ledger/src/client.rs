use std::sync::Arc;

use attest_core::{Address, AttestationDefaults, Attestation, SchemaRecord, Uid};
use attest_crypto::{schema_uid, Identity};
use attest_schema::{SchemaEncoder, SchemaItem};

use crate::error::{LedgerError, RevertReason};
use crate::queue::SubmissionQueue;
use crate::traits::AttestationLedger;
use crate::types::{AttestationRequest, RevocationRequest, SchemaRegistration};

/// High-level client for the attestation registry.
///
/// Writes are signed by the supplied [`Identity`] and serialized per
/// identity through a [`SubmissionQueue`]; each write waits for the
/// transaction to be included. Reads go straight to the ledger.
pub struct LedgerAttestationClient {
    ledger: Arc<dyn AttestationLedger>,
    queue: SubmissionQueue,
    defaults: AttestationDefaults,
}

impl LedgerAttestationClient {
    pub fn new(ledger: Arc<dyn AttestationLedger>) -> Self {
        Self {
            ledger,
            queue: SubmissionQueue::new(),
            defaults: AttestationDefaults::default(),
        }
    }

    /// Use `defaults` for parameters a caller leaves unspecified.
    pub fn with_defaults(mut self, defaults: AttestationDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> AttestationDefaults {
        self.defaults
    }

    pub fn chain_id(&self) -> u64 {
        self.ledger.chain_id()
    }

    /// A registration for `schema` using the configured resolver and
    /// revocability.
    pub fn registration(&self, schema: impl Into<String>) -> SchemaRegistration {
        SchemaRegistration::new(schema, self.defaults.resolver, self.defaults.revocable)
    }

    /// An attestation request under `schema` using the configured
    /// revocability, no expiration and no reference.
    pub fn attestation(&self, schema: Uid, recipient: Address, data: Vec<u8>) -> AttestationRequest {
        AttestationRequest {
            schema,
            recipient,
            revocable: self.defaults.revocable,
            data,
            ..Default::default()
        }
    }

    /// Register a schema, returning its UID.
    ///
    /// Idempotent: an already registered schema is returned without
    /// submitting, and a registration that loses a race to an identical one
    /// counts as success.
    pub async fn register_schema(
        &self,
        identity: &Identity,
        registration: SchemaRegistration,
    ) -> Result<Uid, LedgerError> {
        attest_schema::parse(&registration.schema)?;

        let uid = schema_uid(
            &registration.schema,
            &registration.resolver,
            registration.revocable,
        );

        if self.ledger.get_schema(&uid).await?.is_some() {
            tracing::debug!(schema_uid = %uid, "Schema already registered, skipping submission");
            return Ok(uid);
        }

        let from = identity.address();
        let ledger = self.ledger.as_ref();
        let handle = self
            .queue
            .submit(ledger, from, |tx| ledger.register(tx, registration.clone()))
            .await?;

        match handle.wait().await {
            Ok(registered) => {
                tracing::info!(
                    schema_uid = %registered,
                    schema = %registration.schema,
                    resolver = %registration.resolver,
                    revocable = registration.revocable,
                    "Schema registered"
                );
                Ok(registered)
            }
            Err(LedgerError::Revert(RevertReason::AlreadyExists)) => {
                tracing::debug!(schema_uid = %uid, "Schema registered concurrently");
                Ok(uid)
            }
            Err(e) => {
                tracing::warn!(schema_uid = %uid, error = %e, "Schema registration failed");
                Err(e)
            }
        }
    }

    /// Create an onchain attestation, returning its UID.
    pub async fn attest(
        &self,
        identity: &Identity,
        request: AttestationRequest,
    ) -> Result<Uid, LedgerError> {
        let from = identity.address();
        let schema = request.schema;
        let recipient = request.recipient;
        let ledger = self.ledger.as_ref();

        let handle = self
            .queue
            .submit(ledger, from, |tx| ledger.attest(tx, request))
            .await?;

        match handle.wait().await {
            Ok(uid) => {
                tracing::info!(
                    uid = %uid,
                    schema_uid = %schema,
                    attester = %from,
                    recipient = %recipient,
                    "Attestation created"
                );
                Ok(uid)
            }
            Err(e) => {
                tracing::warn!(schema_uid = %schema, attester = %from, error = %e, "Attestation failed");
                Err(e)
            }
        }
    }

    /// Encode `payload` against `encoder` and attest it. Encoding errors are
    /// raised before anything is submitted.
    pub async fn attest_payload(
        &self,
        identity: &Identity,
        encoder: &SchemaEncoder,
        payload: &[SchemaItem],
        request: AttestationRequest,
    ) -> Result<Uid, LedgerError> {
        let data = encoder.encode(payload)?;
        self.attest(identity, AttestationRequest { data, ..request })
            .await
    }

    /// Revoke an onchain attestation, returning the revocation time.
    pub async fn revoke(
        &self,
        identity: &Identity,
        schema: Uid,
        uid: Uid,
    ) -> Result<u64, LedgerError> {
        let from = identity.address();
        let ledger = self.ledger.as_ref();
        let request = RevocationRequest { schema, uid };

        let handle = self
            .queue
            .submit(ledger, from, |tx| ledger.revoke(tx, request))
            .await?;

        match handle.wait().await {
            Ok(time) => {
                tracing::info!(uid = %uid, schema_uid = %schema, revoker = %from, time, "Attestation revoked");
                Ok(time)
            }
            Err(e) => {
                tracing::warn!(uid = %uid, revoker = %from, error = %e, "Revocation failed");
                Err(e)
            }
        }
    }

    /// Record the identity's revocation of an offchain attestation UID,
    /// returning the revocation time.
    pub async fn revoke_offchain(&self, identity: &Identity, uid: Uid) -> Result<u64, LedgerError> {
        let from = identity.address();
        let ledger = self.ledger.as_ref();

        let handle = self
            .queue
            .submit(ledger, from, |tx| ledger.revoke_offchain(tx, uid))
            .await?;

        match handle.wait().await {
            Ok(time) => {
                tracing::info!(uid = %uid, revoker = %from, time, "Offchain attestation revoked");
                Ok(time)
            }
            Err(e) => {
                tracing::warn!(uid = %uid, revoker = %from, error = %e, "Offchain revocation failed");
                Err(e)
            }
        }
    }

    pub async fn get_schema(&self, uid: &Uid) -> Result<SchemaRecord, LedgerError> {
        tracing::debug!(schema_uid = %uid, "Fetching schema");
        self.ledger
            .get_schema(uid)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("schema {}", uid)))
    }

    pub async fn get_attestation(&self, uid: &Uid) -> Result<Attestation, LedgerError> {
        tracing::debug!(uid = %uid, "Fetching attestation");
        self.ledger
            .get_attestation(uid)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("attestation {}", uid)))
    }

    /// When `revoker` revoked the offchain attestation `uid`, if it has.
    pub async fn offchain_revocation_time(
        &self,
        revoker: &Address,
        uid: &Uid,
    ) -> Result<Option<u64>, LedgerError> {
        self.ledger.offchain_revocation(revoker, uid).await
    }
}
