//! Client configuration loading and management.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::Address;

/// Full configuration for an attestation client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AttestConfig {
    /// Ledger network settings.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Offchain signing domain settings.
    #[serde(default)]
    pub offchain: OffchainConfig,

    /// Defaults applied to optional request parameters.
    #[serde(default)]
    pub defaults: AttestationDefaults,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Chain the client believes it is operating on.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffchainConfig {
    /// Address of the attestation contract bound into signatures.
    #[serde(default)]
    pub verifying_contract: Address,
    /// Signing domain name.
    #[serde(default = "default_domain_name")]
    pub domain_name: String,
    /// Signing domain (contract) version.
    #[serde(default = "default_domain_version")]
    pub domain_version: String,
    /// Offchain attestation struct version produced by signers.
    #[serde(default = "default_attestation_version")]
    pub attestation_version: u16,
}

/// Defaults for optional attestation parameters, resolved once at the call
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AttestationDefaults {
    /// Resolver used when registering a schema without one.
    #[serde(default)]
    pub resolver: Address,
    /// Revocability used when none is given.
    #[serde(default)]
    pub revocable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_chain_id() -> u64 {
    1
}
fn default_domain_name() -> String {
    "EAS Attestation".into()
}
fn default_domain_version() -> String {
    "1.2.0".into()
}
fn default_attestation_version() -> u16 {
    2
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
        }
    }
}

impl Default for OffchainConfig {
    fn default() -> Self {
        Self {
            verifying_contract: Address::ZERO,
            domain_name: default_domain_name(),
            domain_version: default_domain_version(),
            attestation_version: default_attestation_version(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Whether events should be emitted as JSON lines.
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AttestConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: AttestConfig = toml::from_str(&contents)?;
            tracing::debug!(path = %path.display(), "loaded attest config");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }
}
