//! Attest Offchain
//!
//! Attestations signed by the attester and stored wherever the holder likes.
//! Signatures bind a domain (name, version, chain, verifying contract) so an
//! attestation cannot be replayed against another deployment.

pub mod domain;
pub mod error;
pub mod signer;
pub mod types;
pub mod verifier;

mod typed;

pub use domain::OffchainDomain;
pub use error::OffchainError;
pub use signer::OffchainAttestationSigner;
pub use types::{
    offchain_uid, OffchainAttestation, OffchainAttestationRequest, SignedOffchainAttestation,
    SUPPORTED_VERSIONS, VERSION_LEGACY, VERSION_SALTED,
};
pub use verifier::OffchainAttestationVerifier;
