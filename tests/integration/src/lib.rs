//! Shared fixtures for the cross-crate tests in `tests/`.

use std::sync::Arc;

use attest_core::{Address, AttestConfig, LoggingConfig};
use attest_ledger::{InMemoryLedger, LedgerAttestationClient};
use attest_offchain::OffchainDomain;
use tracing_subscriber::EnvFilter;

/// Chain id used by every fixture ledger.
pub const TEST_CHAIN_ID: u64 = 31337;

/// Install a test-writer fmt subscriber once per test binary, using the
/// default logging section.
pub fn init_tracing() {
    init_tracing_with(&LoggingConfig::default());
}

/// Install a test-writer fmt subscriber for `logging`. `RUST_LOG` overrides
/// the configured level. Returns `false` if a subscriber was already set.
pub fn init_tracing_with(logging: &LoggingConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer();
    let installed = if logging.is_json() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}

/// A fresh in-memory ledger and a client bound to it.
pub fn ledger_and_client() -> (Arc<InMemoryLedger>, LedgerAttestationClient) {
    let ledger = Arc::new(InMemoryLedger::new(TEST_CHAIN_ID));
    let client = LedgerAttestationClient::new(ledger.clone());
    (ledger, client)
}

/// Configuration pointing at the fixture chain and a fixed verifying
/// contract.
pub fn test_config() -> AttestConfig {
    let mut config = AttestConfig::default();
    config.network.chain_id = TEST_CHAIN_ID;
    config.offchain.verifying_contract = Address([0x4e; 20]);
    config
}

pub fn test_domain() -> OffchainDomain {
    OffchainDomain::from_config(&test_config())
}
