//! Attest Core: fundamental types, errors, and configuration for the
//! Attest attestation protocol.

pub mod config;
pub mod error;
pub mod types;

pub use config::{AttestConfig, AttestationDefaults, LoggingConfig};
pub use error::CoreError;
pub use types::{unix_now, Address, Attestation, SchemaRecord, Uid, NO_EXPIRATION};
