use attest_core::Address;
use attest_crypto::{recover_address, verify_address};

use crate::domain::OffchainDomain;
use crate::error::OffchainError;
use crate::types::SignedOffchainAttestation;

/// Verifies offchain attestation signatures.
///
/// Verification is pure: it recomputes the digest from the embedded domain
/// and fields and checks who signed it. Whether the embedded chain matches
/// the one the caller is on is left to [`verify_with_domain`].
///
/// [`verify_with_domain`]: OffchainAttestationVerifier::verify_with_domain
#[derive(Debug, Clone, Copy, Default)]
pub struct OffchainAttestationVerifier;

impl OffchainAttestationVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Whether `claimed_attester` signed `signed`.
    ///
    /// A well-formed signature from someone else (or over different values)
    /// yields `Ok(false)`. Unknown versions are an error.
    pub fn verify(
        &self,
        claimed_attester: &Address,
        signed: &SignedOffchainAttestation,
    ) -> Result<bool, OffchainError> {
        let digest = signed.digest()?;
        let valid = verify_address(&digest, &signed.signature, claimed_attester);
        tracing::debug!(
            uid = %signed.uid(),
            attester = %claimed_attester,
            version = signed.message.version,
            valid,
            "Offchain attestation verified"
        );
        Ok(valid)
    }

    /// Like [`verify`](Self::verify), but also requires the embedded domain
    /// to equal `trusted`.
    pub fn verify_with_domain(
        &self,
        claimed_attester: &Address,
        signed: &SignedOffchainAttestation,
        trusted: &OffchainDomain,
    ) -> Result<bool, OffchainError> {
        if signed.domain != *trusted {
            tracing::debug!(
                uid = %signed.uid(),
                chain_id = signed.domain.chain_id,
                trusted_chain_id = trusted.chain_id,
                "Offchain attestation signed under an untrusted domain"
            );
            return Ok(false);
        }
        self.verify(claimed_attester, signed)
    }

    /// Address the signature recovers to.
    pub fn recover_attester(
        &self,
        signed: &SignedOffchainAttestation,
    ) -> Result<Address, OffchainError> {
        let digest = signed.digest()?;
        Ok(recover_address(&digest, &signed.signature)?)
    }
}
