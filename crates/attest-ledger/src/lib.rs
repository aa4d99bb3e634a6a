//! Attest Ledger
//!
//! Client-side protocol for the on-ledger attestation registry: schema
//! registration, attestation, revocation, and the offchain revocation
//! registry, behind a pluggable ledger adapter.

pub mod adapters;
pub mod client;
pub mod error;
pub mod queue;
pub mod traits;
pub mod types;

pub use adapters::InMemoryLedger;
pub use client::LedgerAttestationClient;
pub use error::{LedgerError, RevertReason};
pub use queue::SubmissionQueue;
pub use traits::AttestationLedger;
pub use types::{
    AttestationRequest, RevocationRequest, SchemaRegistration, TransactionHandle, TxEnvelope,
};
