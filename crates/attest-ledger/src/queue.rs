use std::future::Future;
use std::sync::Arc;

use attest_core::Address;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::error::LedgerError;
use crate::traits::AttestationLedger;
use crate::types::{TransactionHandle, TxEnvelope};

/// Serializes writes per sender.
///
/// Each address owns a slot holding its cached next nonce. The slot lock is
/// held from nonce selection until the ledger accepts or rejects the
/// submission, never while waiting for confirmation. A rejected submission
/// clears the cache so the next one rediscovers the nonce from the ledger.
#[derive(Default)]
pub struct SubmissionQueue {
    slots: DashMap<Address, Arc<Mutex<Option<u64>>>>,
}

impl SubmissionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, from: &Address) -> Arc<Mutex<Option<u64>>> {
        self.slots
            .entry(*from)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// Submit a transaction from `from` with the next nonce in sequence.
    pub async fn submit<T, F, Fut>(
        &self,
        ledger: &dyn AttestationLedger,
        from: Address,
        send: F,
    ) -> Result<TransactionHandle<T>, LedgerError>
    where
        F: FnOnce(TxEnvelope) -> Fut,
        Fut: Future<Output = Result<TransactionHandle<T>, LedgerError>>,
    {
        let slot = self.slot(&from);
        let mut next = slot.lock().await;

        let nonce = match *next {
            Some(nonce) => nonce,
            None => ledger.transaction_count(&from).await?,
        };

        match send(TxEnvelope { from, nonce }).await {
            Ok(handle) => {
                *next = Some(nonce + 1);
                tracing::debug!(from = %from, nonce, tx = %handle.hash(), "Transaction accepted");
                Ok(handle)
            }
            Err(e) => {
                *next = None;
                tracing::debug!(from = %from, nonce, error = %e, "Submission rejected, nonce cache cleared");
                Err(e)
            }
        }
    }

    /// Cached next nonce for `from`, if any.
    pub async fn cached_nonce(&self, from: &Address) -> Option<u64> {
        let slot = self.slots.get(from).map(|s| s.clone())?;
        let next = slot.lock().await;
        *next
    }
}
