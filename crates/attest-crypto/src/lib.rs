pub mod error;
pub mod hashing;
pub mod keys;
pub mod signing;

pub use error::CryptoError;
pub use hashing::{attestation_uid, hash, schema_uid, Hash};
pub use keys::{Identity, PublicKey};
pub use signing::{recover_address, sign_digest, verify_address, Signature};
