use attest_core::config::AttestConfig;
use attest_core::Address;
use attest_crypto::Hash;
use serde::{Deserialize, Serialize};

use crate::typed::StructHasher;

const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Signing domain bound into every offchain attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffchainDomain {
    pub name: String,
    /// Protocol version of the verifying contract, e.g. `"1.2.0"`.
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl OffchainDomain {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id,
            verifying_contract,
        }
    }

    /// Domain described by the `network` and `offchain` config sections.
    pub fn from_config(config: &AttestConfig) -> Self {
        Self::new(
            config.offchain.domain_name.clone(),
            config.offchain.domain_version.clone(),
            config.network.chain_id,
            config.offchain.verifying_contract,
        )
    }

    /// Domain separator hash.
    pub fn separator(&self) -> Hash {
        StructHasher::new(DOMAIN_TYPE)
            .dynamic(self.name.as_bytes())
            .dynamic(self.version.as_bytes())
            .uint(self.chain_id)
            .address(&self.verifying_contract)
            .finish()
    }
}
