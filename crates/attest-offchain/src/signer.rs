use attest_core::config::AttestConfig;
use attest_core::unix_now;
use attest_crypto::{sign_digest, Identity};
use attest_schema::{SchemaEncoder, SchemaItem};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::domain::OffchainDomain;
use crate::error::OffchainError;
use crate::types::{
    OffchainAttestation, OffchainAttestationRequest, SignedOffchainAttestation, VERSION_LEGACY,
    VERSION_SALTED,
};

/// Signs offchain attestations under a fixed domain. Never touches the
/// network.
#[derive(Debug, Clone)]
pub struct OffchainAttestationSigner {
    domain: OffchainDomain,
    version: u16,
}

impl OffchainAttestationSigner {
    /// Signer producing salted (version 2) attestations.
    pub fn new(domain: OffchainDomain) -> Self {
        Self {
            domain,
            version: VERSION_SALTED,
        }
    }

    /// Signer for the domain and version in `config`.
    pub fn from_config(config: &AttestConfig) -> Result<Self, OffchainError> {
        Self::new(OffchainDomain::from_config(config))
            .with_version(config.offchain.attestation_version)
    }

    pub fn with_version(mut self, version: u16) -> Result<Self, OffchainError> {
        if version != VERSION_LEGACY && version != VERSION_SALTED {
            return Err(OffchainError::UnsupportedVersion(version));
        }
        self.version = version;
        Ok(self)
    }

    pub fn domain(&self) -> &OffchainDomain {
        &self.domain
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    /// Sign `request`, stamping the current wall-clock time.
    pub fn sign(
        &self,
        identity: &Identity,
        request: OffchainAttestationRequest,
    ) -> Result<SignedOffchainAttestation, OffchainError> {
        self.sign_at(identity, request, unix_now())
    }

    /// Sign `request` with an explicit signing time.
    pub fn sign_at(
        &self,
        identity: &Identity,
        request: OffchainAttestationRequest,
        time: u64,
    ) -> Result<SignedOffchainAttestation, OffchainError> {
        let salt = (self.version == VERSION_SALTED).then(|| {
            let mut salt = [0u8; 32];
            OsRng.fill_bytes(&mut salt);
            salt
        });

        let message = OffchainAttestation {
            version: self.version,
            schema: request.schema,
            recipient: request.recipient,
            time,
            expiration_time: request.expiration_time,
            revocable: request.revocable,
            ref_uid: request.ref_uid,
            data: request.data,
            salt,
        };

        let digest = message.signing_digest(&self.domain)?;
        let signature = sign_digest(&digest, identity)?;
        let signed = SignedOffchainAttestation {
            message,
            domain: self.domain.clone(),
            signature,
        };

        tracing::info!(
            uid = %signed.uid(),
            attester = %identity.address(),
            schema_uid = %signed.message.schema,
            version = self.version,
            chain_id = self.domain.chain_id,
            "Offchain attestation signed"
        );

        Ok(signed)
    }

    /// Encode `payload` against `encoder` and sign it in place of
    /// `request.data`.
    pub fn sign_payload(
        &self,
        identity: &Identity,
        encoder: &SchemaEncoder,
        payload: &[SchemaItem],
        request: OffchainAttestationRequest,
    ) -> Result<SignedOffchainAttestation, OffchainError> {
        let data = encoder.encode(payload)?;
        self.sign(identity, OffchainAttestationRequest { data, ..request })
    }
}
